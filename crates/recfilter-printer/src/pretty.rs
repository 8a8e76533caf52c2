//! Pretty-printer: renders an [`Expr`] back to filter source. Every
//! binary node is fully parenthesized, so the printed form always
//! re-parses to a tree equivalent to the one it was printed from,
//! regardless of the original source's grouping.

use recfilter_parser::{
    accept, format_timedelta, ComparisonOp, Expr, ExprVisitor, IntValue, IpLit, Literal,
    LogicalOp, MathOp, UnaryOp,
};

/// Renders `expr` as filter source.
pub fn print(expr: &Expr) -> String {
    let mut printer = PrettyPrinter;
    accept(expr, &mut printer, &())
}

struct PrettyPrinter;

impl ExprVisitor<()> for PrettyPrinter {
    type Output = String;

    fn visit_ipv4(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> String {
        print_ip_literal(lit)
    }

    fn visit_ipv6(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> String {
        print_ip_literal(lit)
    }

    fn visit_datetime(&mut self, lit: &Literal<chrono::DateTime<chrono::Utc>>, _ctx: &()) -> String {
        match lit {
            Literal::Typed(dt) => dt.to_rfc3339(),
            Literal::Raw(s) => s.clone(),
        }
    }

    fn visit_timedelta(&mut self, lit: &Literal<chrono::Duration>, _ctx: &()) -> String {
        match lit {
            Literal::Typed(d) => format_timedelta(*d),
            Literal::Raw(s) => s.clone(),
        }
    }

    fn visit_integer(&mut self, value: IntValue, _ctx: &()) -> String {
        value.0.to_string()
    }

    fn visit_float(&mut self, value: f64, _ctx: &()) -> String {
        value.to_string()
    }

    fn visit_constant(&mut self, value: &str, _ctx: &()) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }

    fn visit_variable(&mut self, path: &str, _ctx: &()) -> String {
        path.to_string()
    }

    fn visit_list(&mut self, items: Vec<String>, _ctx: &()) -> String {
        format!("[{}]", items.join(", "))
    }

    fn visit_function(&mut self, name: &str, args: Vec<String>, _ctx: &()) -> String {
        format!("{}({})", name, args.join(", "))
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: String, _ctx: &()) -> String {
        match op {
            UnaryOp::Not => format!("NOT {operand}"),
            UnaryOp::Exists => format!("?{operand}"),
        }
    }

    fn visit_logical(&mut self, op: LogicalOp, left: String, right: String, _ctx: &()) -> String {
        format!("({left} {} {right})", logical_op_text(op))
    }

    fn visit_comparison(
        &mut self,
        op: ComparisonOp,
        left: String,
        right: String,
        _ctx: &(),
    ) -> String {
        format!("({left} {} {right})", comparison_op_text(op))
    }

    fn visit_math(&mut self, op: MathOp, left: String, right: String, _ctx: &()) -> String {
        format!("({left} {} {right})", math_op_text(op))
    }
}

fn print_ip_literal(lit: &Literal<IpLit>) -> String {
    match lit {
        Literal::Typed(ip) => ip.to_string(),
        Literal::Raw(s) => s.clone(),
    }
}

fn logical_op_text(op: LogicalOp) -> &'static str {
    match op {
        LogicalOp::Or => "OR",
        LogicalOp::And => "AND",
        LogicalOp::Xor => "XOR",
        LogicalOp::OrShort => "||",
        LogicalOp::AndShort => "&&",
        LogicalOp::XorShort => "^^",
    }
}

fn comparison_op_text(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "==",
        ComparisonOp::Ne => "!=",
        ComparisonOp::Lt => "<",
        ComparisonOp::Le => "<=",
        ComparisonOp::Gt => ">",
        ComparisonOp::Ge => ">=",
        ComparisonOp::Like => "=~",
        ComparisonOp::In => "IN",
        ComparisonOp::Is => "IS",
    }
}

fn math_op_text(op: MathOp) -> &'static str {
    match op {
        MathOp::Add => "+",
        MathOp::Sub => "-",
        MathOp::Mul => "*",
        MathOp::Div => "/",
        MathOp::Mod => "%",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use recfilter_parser::parse;

    #[test]
    fn prints_simple_comparison() {
        let expr = parse(r#"Source.IP4 == "127.0.0.1""#).unwrap();
        assert_eq!(print(&expr), r#"(Source.IP4 == "127.0.0.1")"#);
    }

    #[test]
    fn prints_nested_logical_expression() {
        let expr = parse(r#"(Source.IP4 == "127.0.0.1") AND (size(Target.IP4) gt 0)"#).unwrap();
        let expected = indoc! {r#"
            ((Source.IP4 == "127.0.0.1") AND (size(Target.IP4) > 0))"#}
        .trim_end_matches('\n')
        .to_string();
        assert_eq!(print(&expr), expected);
    }

    #[test]
    fn prints_round_trips_through_the_parser() {
        let expr = parse("A AND B OR C").unwrap();
        let printed = print(&expr);
        let reparsed = parse(&printed).unwrap();
        assert_eq!(print(&reparsed), printed);
    }

    #[test]
    fn prints_function_call() {
        let expr = parse("size(Source.IP4) gt 0").unwrap();
        assert_eq!(print(&expr), "(size(Source.IP4) > 0)");
    }

    #[test]
    fn prints_not_and_exists() {
        let expr = parse("NOT ?Source.IP4").unwrap();
        assert_eq!(print(&expr), "NOT ?Source.IP4");
    }
}
