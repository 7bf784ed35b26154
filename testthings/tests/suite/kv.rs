use std::sync::Mutex;

use pretty_assertions::assert_eq;
use serde_json::json;
use testthings::Kv;
use testthings::Logger;
use testthings::format_kv;
use testthings::kv;
use testthings::kv::Interceptor;
use testthings::log_kv;

#[derive(Default)]
struct Lines(Mutex<Vec<String>>);

impl Logger for Lines {
    fn log(&self, msg: &str) {
        self.0.lock().unwrap().push(msg.to_string());
    }
}

impl Lines {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

#[test]
fn assertion_context_reads_naturally() {
    let ctx = kv! {
        "user" => "alice",
        "attempt" => 3,
        "roles" => json!(["admin", "dev"]),
    };

    assert_eq!(
        format_kv("%v=%v, ", &ctx),
        r#"attempt=3, roles=["admin","dev"], user=alice"#
    );
    assert_eq!(
        ctx.format(""),
        r#"attempt="3" roles="[\"admin\",\"dev\"]" user="alice""#
    );
}

#[test]
fn logs_one_line_per_pair_in_key_order() {
    let lines = Lines::default();
    let ctx: Kv = [("zeta", "last"), ("alpha", "first")].into_iter().collect();

    log_kv(&lines, &ctx);
    assert_eq!(lines.take(), vec![r#"alpha="first""#, r#"zeta="last""#]);

    ctx.logf(&lines, "%[2]v <- %[1]v");
    assert_eq!(lines.take(), vec!["first <- alpha", "last <- zeta"]);
}

#[test]
fn format_problems_are_rendered_inline() {
    let ctx = kv! { "k" => "v" };

    assert_eq!(ctx.format("%v=%v=%v"), "k=v=%!v(MISSING)");
    assert_eq!(ctx.format("%v"), "k%!(EXTRA v)");
    assert_eq!(ctx.format("%[3]v"), "%!v(BADINDEX)");
    assert_eq!(ctx.format("%v%"), "k%!(NOVERB)%!(EXTRA v)");
    assert_eq!(ctx.format("100%% %v"), "100% k%!(EXTRA v)");
}

#[test]
fn interceptors_control_rendering() {
    let ctx = kv! { "token" => "s3cr3t", "user" => "bob" };
    let intercept = Interceptor::new()
        .with_display(|v| match v.as_str() {
            Some("s3cr3t") => "<redacted>".to_string(),
            _ => String::new(),
        })
        .with_source(|v| format!("src({v})"));

    assert_eq!(
        ctx.format_with("%v=%v, ", &intercept),
        "token=<redacted>, user=bob"
    );
    assert_eq!(
        ctx.format_with("%#v ", &intercept),
        r#"src("token")%!(EXTRA <redacted>) src("user")%!(EXTRA bob)"#
    );
}
