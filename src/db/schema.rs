pub const CREATE_CLIPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS clips (
  id TEXT PRIMARY KEY,
  text TEXT,
  language TEXT,
  name TEXT,
  device_type TEXT,
  browser TEXT
);
"#;
