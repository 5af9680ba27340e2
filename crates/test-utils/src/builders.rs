#![allow(dead_code)]

use serde_json::{json, Map, Value};

/// Builder for one line of `go test -json` output.
///
/// ```ignore
/// let line = EventLine::new("pass").package("pkg/a").test("TestA").elapsed(0.01).build();
/// ```
pub struct EventLine {
    fields: Map<String, Value>,
}

impl EventLine {
    pub fn new(action: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("Time".to_string(), json!("2024-05-01T10:00:00.123456789+02:00"));
        fields.insert("Action".to_string(), json!(action));
        Self { fields }
    }

    pub fn package(mut self, name: &str) -> Self {
        self.fields.insert("Package".to_string(), json!(name));
        self
    }

    pub fn test(mut self, name: &str) -> Self {
        self.fields.insert("Test".to_string(), json!(name));
        self
    }

    pub fn output(mut self, text: &str) -> Self {
        self.fields.insert("Output".to_string(), json!(text));
        self
    }

    pub fn elapsed(mut self, secs: f64) -> Self {
        self.fields.insert("Elapsed".to_string(), json!(secs));
        self
    }

    pub fn build(self) -> String {
        Value::Object(self.fields).to_string()
    }
}

/// Join lines into a newline-terminated output buffer.
pub fn output_of<I, S>(lines: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out.into_bytes()
}
