use clap::Parser;
use safecalc::{Value, evaluate_expression};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// safecalc evaluates a single untrusted calculator expression.
///
/// Integer results are printed in decimal, hexadecimal, octal and binary,
/// one per line. Expressions that cannot be evaluated print nothing; set
/// `RUST_LOG=debug` to see why.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The expression, e.g. `0x1234 + 0x5678`. May start with `-`.
    #[arg(allow_hyphen_values = true)]
    expression: Option<String>,
}

fn main() {
    let args = Args::parse();
    init_tracing();

    let text = args.expression.unwrap_or_default();
    match evaluate_expression(&text) {
        Ok(value) => println!("{}", render(&value)),
        Err(err) => debug!("rejected:\n{}", err.to_diagnostic(&text)),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// The lines printed for a successful evaluation.
fn render(value: &Value) -> String {
    match value.as_integral() {
        Some(n) => format_radixes(n),
        None => value.to_string(),
    }
}

/// `n` in decimal, hex, octal and binary with radix prefixes. Negative
/// numbers carry the sign before the prefix (`-0x5`).
fn format_radixes(n: i64) -> String {
    let sign = if n < 0 { "-" } else { "" };
    let magnitude = n.unsigned_abs();
    format!(
        "{n}\n{sign}{magnitude:#x}\n{sign}{magnitude:#o}\n{sign}{magnitude:#b}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Option<String> {
        evaluate_expression(text).ok().map(|value| render(&value))
    }

    #[test]
    fn test_integer_output() {
        assert_eq!(run("0x10 + 2").unwrap(), "18\n0x12\n0o22\n0b10010");
        assert_eq!(run("-5").unwrap(), "-5\n-0x5\n-0o5\n-0b101");
        assert_eq!(run("0").unwrap(), "0\n0x0\n0o0\n0b0");
    }

    #[test]
    fn test_integral_values_use_radixes() {
        assert_eq!(run("True").unwrap(), "1\n0x1\n0o1\n0b1");
        assert_eq!(run("6 / 3").unwrap(), "2\n0x2\n0o2\n0b10");
    }

    #[test]
    fn test_other_values_use_display() {
        assert_eq!(run("1 / 4").unwrap(), "0.25");
        assert_eq!(run("'a' 'b'").unwrap(), "ab");
        assert_eq!(run("[1, 'x']").unwrap(), "[1, 'x']");
        assert_eq!(run("None").unwrap(), "None");
        assert_eq!(run("1e300").unwrap(), "1e+300");
    }

    #[test]
    fn test_extremes() {
        assert_eq!(
            format_radixes(i64::MIN),
            format!(
                "-9223372036854775808\n-0x8000000000000000\n-0o1000000000000000000000\n-0b1{}",
                "0".repeat(63)
            )
        );
    }

    #[test]
    fn test_errors_render_nothing() {
        assert_eq!(run(""), None);
        assert_eq!(run("__import__('os')"), None);
        assert_eq!(run("1 / 0"), None);
    }

    #[test]
    fn test_args() {
        use clap::CommandFactory;
        Args::command().debug_assert();

        let args = Args::try_parse_from(["safecalc"]).unwrap();
        assert_eq!(args.expression, None);
        let args = Args::try_parse_from(["safecalc", "1 + 1"]).unwrap();
        assert_eq!(args.expression.as_deref(), Some("1 + 1"));
        assert!(Args::try_parse_from(["safecalc", "1", "2"]).is_err());
    }

    #[test]
    fn test_negative_expression_args() {
        let args = Args::try_parse_from(["safecalc", "-5"]).unwrap();
        assert_eq!(args.expression.as_deref(), Some("-5"));
        let args = Args::try_parse_from(["safecalc", "-0x10 + 1"]).unwrap();
        assert_eq!(args.expression.as_deref(), Some("-0x10 + 1"));
        let args = Args::try_parse_from(["safecalc", "~0"]).unwrap();
        assert_eq!(args.expression.as_deref(), Some("~0"));

        assert_eq!(run("-0x10 + 1").unwrap(), "-15\n-0xf\n-0o17\n-0b1111");
    }
}
