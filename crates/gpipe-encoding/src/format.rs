use std::fmt;
use std::str::FromStr;

/// The two interchangeable wire formats the orchestrator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WireFormat {
  /// Structured document (JSON).
  #[default]
  Json,
  /// Canonical line-oriented text (YAML).
  Yaml,
}

impl WireFormat {
  /// Value for the `Content-Type` request header.
  pub fn content_type(&self) -> &'static str {
    match self {
      WireFormat::Json => "application/json",
      WireFormat::Yaml => "application/x-yaml",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      WireFormat::Json => "json",
      WireFormat::Yaml => "yaml",
    }
  }
}

impl fmt::Display for WireFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wire format '{0}', expected 'json' or 'yaml'")]
pub struct UnknownFormat(pub String);

impl FromStr for WireFormat {
  type Err = UnknownFormat;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "json" => Ok(WireFormat::Json),
      "yaml" | "yml" => Ok(WireFormat::Yaml),
      _ => Err(UnknownFormat(s.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_content_types() {
    assert_eq!(WireFormat::Json.content_type(), "application/json");
    assert_eq!(WireFormat::Yaml.content_type(), "application/x-yaml");
  }

  #[test]
  fn test_parse() {
    assert_eq!("JSON".parse::<WireFormat>(), Ok(WireFormat::Json));
    assert_eq!("yml".parse::<WireFormat>(), Ok(WireFormat::Yaml));
    assert_eq!(
      "toml".parse::<WireFormat>(),
      Err(UnknownFormat("toml".to_string()))
    );
  }
}
