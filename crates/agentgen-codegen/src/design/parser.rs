use super::schema::DesignConfig;
use super::Result;
use std::path::Path;

pub fn parse_yaml_file<P: AsRef<Path>>(path: P) -> Result<DesignConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml_str(&content)
}

pub fn parse_yaml_str(yaml: &str) -> Result<DesignConfig> {
    let config: DesignConfig = serde_yaml::from_str(yaml)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::schema::AttributeConfig;
    use crate::error::DesignError;
    use std::io::Write;

    const DESIGN: &str = r#"
service: { name: alpha }
root: example.com/app/gen
types:
  Citation:
    service: alpha
    type: { object: { fields: { url: string, score: { type: float64, default: 0.5 } }, required: [url] } }
toolsets:
  - name: alpha.docs
    specs_dir: gen/alpha/agents/docs/specs/docs
    tools:
      - name: summarize
        args: string
        return: { array: Citation }
        method:
          name: Summarize
          payload: string
          result: { map: { key: string, value: Citation } }
          payload_ref: string
          result_ref: "map[string]*alpha.Citation"
        server_data:
          - { kind: sources, field: sources }
"#;

    #[test]
    fn test_parse_design_document() {
        let config = parse_yaml_str(DESIGN).unwrap();
        assert_eq!(config.service.name, "alpha");
        assert_eq!(config.root.as_deref(), Some("example.com/app/gen"));

        let citation = &config.types["Citation"];
        let AttributeConfig::Object { object } = &citation.ty else {
            panic!("expected an object, got {:?}", citation.ty);
        };
        assert_eq!(object.required, vec!["url"]);
        assert!(matches!(
            object.fields["score"],
            AttributeConfig::WithDefault { .. }
        ));

        let tool = &config.toolsets[0].tools[0];
        assert!(matches!(tool.result, Some(AttributeConfig::Array { .. })));
        let method = tool.method.as_ref().unwrap();
        assert!(matches!(method.result, Some(AttributeConfig::Map { .. })));
        assert_eq!(tool.server_data[0].field, "sources");
    }

    #[test]
    fn test_parse_design_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DESIGN.as_bytes()).unwrap();
        let config = parse_yaml_file(file.path()).unwrap();
        assert_eq!(config.toolsets.len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_yaml_str("toolsets: []"),
            Err(DesignError::Yaml(_))
        ));
        assert!(matches!(
            parse_yaml_file("/nonexistent/agentgen/design.yaml"),
            Err(DesignError::Io(_))
        ));
    }
}
