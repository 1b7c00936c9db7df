//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `apibase_core` linkage with deterministic output.
//! - Render `<condition> [values...]` through the filter composer for quick
//!   manual checks of placeholder arity.

use apibase_core::filter::{apply_all, prepare_filters, FilterArg, FilterValue};
use apibase_core::SelectQuery;
use std::process::ExitCode;

const PROBE_TABLE: &str = "probe";

fn main() -> ExitCode {
    println!("apibase_core ping={}", apibase_core::ping());
    println!("apibase_core version={}", apibase_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(condition) = args.next() else {
        return ExitCode::SUCCESS;
    };

    let mut filter_args = vec![FilterArg::Condition(condition)];
    filter_args.extend(args.map(|arg| FilterArg::Value(parse_value(&arg))));

    match prepare_filters(filter_args) {
        Ok(filters) => {
            let (sql, params) = apply_all(SelectQuery::new(PROBE_TABLE), &filters).to_sql();
            println!("sql={sql}");
            println!("params={params:?}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error={err}");
            ExitCode::from(2)
        }
    }
}

/// Integers bind as integers; everything else binds as text.
fn parse_value(raw: &str) -> FilterValue {
    raw.parse::<i64>()
        .map(FilterValue::Integer)
        .unwrap_or_else(|_| FilterValue::text(raw))
}
