//! HTML renderer: the same tree walked by [`crate::pretty`], rendering
//! each node wrapped in a `<span>` carrying a CSS class naming its kind,
//! with text content escaped for embedding in a page. Meant for
//! diagnostics, not for round-tripping.

use recfilter_parser::{
    accept, format_timedelta, ComparisonOp, Expr, ExprVisitor, IntValue, IpLit, Literal,
    LogicalOp, MathOp, UnaryOp,
};

pub fn render(expr: &Expr) -> String {
    let mut renderer = HtmlRenderer;
    accept(expr, &mut renderer, &())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn span(class: &str, body: impl std::fmt::Display) -> String {
    format!("<span class=\"{class}\">{body}</span>")
}

struct HtmlRenderer;

impl ExprVisitor<()> for HtmlRenderer {
    type Output = String;

    fn visit_ipv4(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> String {
        span("ip", escape(&ip_literal_text(lit)))
    }

    fn visit_ipv6(&mut self, lit: &Literal<IpLit>, _ctx: &()) -> String {
        span("ip", escape(&ip_literal_text(lit)))
    }

    fn visit_datetime(
        &mut self,
        lit: &Literal<chrono::DateTime<chrono::Utc>>,
        _ctx: &(),
    ) -> String {
        let text = match lit {
            Literal::Typed(dt) => dt.to_rfc3339(),
            Literal::Raw(s) => s.clone(),
        };
        span("datetime", escape(&text))
    }

    fn visit_timedelta(&mut self, lit: &Literal<chrono::Duration>, _ctx: &()) -> String {
        let text = match lit {
            Literal::Typed(d) => format_timedelta(*d),
            Literal::Raw(s) => s.clone(),
        };
        span("timedelta", escape(&text))
    }

    fn visit_integer(&mut self, value: IntValue, _ctx: &()) -> String {
        span("integer", value.0)
    }

    fn visit_float(&mut self, value: f64, _ctx: &()) -> String {
        span("float", value)
    }

    fn visit_constant(&mut self, value: &str, _ctx: &()) -> String {
        span("constant", format!("&quot;{}&quot;", escape(value)))
    }

    fn visit_variable(&mut self, path: &str, _ctx: &()) -> String {
        span("variable", escape(path))
    }

    fn visit_list(&mut self, items: Vec<String>, _ctx: &()) -> String {
        format!("<span class=\"list\">[{}]</span>", items.join(", "))
    }

    fn visit_function(&mut self, name: &str, args: Vec<String>, _ctx: &()) -> String {
        format!(
            "<span class=\"function\"><span class=\"fn-name\">{}</span>({})</span>",
            escape(name),
            args.join(", ")
        )
    }

    fn visit_unary(&mut self, op: UnaryOp, operand: String, _ctx: &()) -> String {
        let label = match op {
            UnaryOp::Not => "NOT",
            UnaryOp::Exists => "EXISTS",
        };
        format!(
            "<span class=\"unary\"><span class=\"op\">{label}</span> {operand}</span>"
        )
    }

    fn visit_logical(&mut self, op: LogicalOp, left: String, right: String, _ctx: &()) -> String {
        binary_span("logical", logical_op_label(op), left, right)
    }

    fn visit_comparison(
        &mut self,
        op: ComparisonOp,
        left: String,
        right: String,
        _ctx: &(),
    ) -> String {
        binary_span("comparison", comparison_op_label(op), left, right)
    }

    fn visit_math(&mut self, op: MathOp, left: String, right: String, _ctx: &()) -> String {
        binary_span("math", math_op_label(op), left, right)
    }
}

fn binary_span(class: &str, op_label: &str, left: String, right: String) -> String {
    format!(
        "<span class=\"{class}\">{left} <span class=\"op\">{op_label}</span> {right}</span>"
    )
}

fn ip_literal_text(lit: &Literal<IpLit>) -> String {
    match lit {
        Literal::Typed(ip) => ip.to_string(),
        Literal::Raw(s) => s.clone(),
    }
}

fn logical_op_label(op: LogicalOp) -> &'static str {
    match op {
        LogicalOp::Or => "OR",
        LogicalOp::And => "AND",
        LogicalOp::Xor => "XOR",
        LogicalOp::OrShort => "||",
        LogicalOp::AndShort => "&amp;&amp;",
        LogicalOp::XorShort => "^^",
    }
}

fn comparison_op_label(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Eq => "==",
        ComparisonOp::Ne => "!=",
        ComparisonOp::Lt => "&lt;",
        ComparisonOp::Le => "&lt;=",
        ComparisonOp::Gt => "&gt;",
        ComparisonOp::Ge => "&gt;=",
        ComparisonOp::Like => "=~",
        ComparisonOp::In => "IN",
        ComparisonOp::Is => "IS",
    }
}

fn math_op_label(op: MathOp) -> &'static str {
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
    use recfilter_parser::parse;

    #[test]
    fn renders_variable_and_constant() {
        let expr = parse(r#"Source.IP4 == "<script>""#).unwrap();
        let html = render(&expr);
        assert!(html.contains("class=\"variable\""));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn renders_comparison_operator_escaped() {
        let expr = parse("A < B").unwrap();
        assert!(render(&expr).contains("&lt;"));
    }

    #[test]
    fn renders_function_call() {
        let expr = parse("size(Source.IP4)").unwrap();
        let html = render(&expr);
        assert!(html.contains("class=\"function\""));
        assert!(html.contains("class=\"fn-name\""));
    }
}
