//! Server configuration: CLI flags with environment fallbacks

use std::path::{Path, PathBuf};

use crate::constants::standard_registry;
use crate::error::{Error, Result};
use crate::registry::{Registry, RegistryDefinition};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const ENV_PORT: &str = "ROLEMASK_PORT";
pub const ENV_BIND: &str = "ROLEMASK_BIND";
pub const ENV_REGISTRY: &str = "ROLEMASK_REGISTRY";

pub const USAGE: &str = "\
rolemask-server - stateless permission evaluation service

USAGE:
    rolemask-server [OPTIONS]

OPTIONS:
    -p, --port <PORT>        Listen on PORT (env ROLEMASK_PORT, default: 3000)
    -b, --bind <ADDR>        Bind address (env ROLEMASK_BIND, default: 0.0.0.0)
    -r, --registry <PATH>    JSON registry definition (env ROLEMASK_REGISTRY)
    -h, --help               Show this help message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub bind: String,
    /// `None` serves the standard registry
    pub registry_path: Option<PathBuf>,
    pub help: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            registry_path: None,
            help: false,
        }
    }
}

impl ServerConfig {
    /// Resolve from process arguments and environment
    pub fn from_env() -> Result<Self> {
        Self::parse(std::env::args().skip(1), |k| std::env::var(k).ok())
    }

    /// Resolve from explicit arguments (program name excluded) and an
    /// environment lookup. Flags win over environment values.
    pub fn parse<I, E>(args: I, env: E) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let mut cfg = ServerConfig::default();
        if let Some(port) = env(ENV_PORT) {
            cfg.port = parse_port(&port)?;
        }
        if let Some(bind) = env(ENV_BIND) {
            cfg.bind = bind;
        }
        if let Some(path) = env(ENV_REGISTRY) {
            cfg.registry_path = Some(PathBuf::from(path));
        }

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" | "-p" => cfg.port = parse_port(&value(&arg, args.next())?)?,
                "--bind" | "-b" => cfg.bind = value(&arg, args.next())?,
                "--registry" | "-r" => cfg.registry_path = Some(PathBuf::from(value(&arg, args.next())?)),
                "--help" | "-h" => cfg.help = true,
                other => return Err(Error::Config(format!("unknown argument '{other}'"))),
            }
        }
        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// The registry to serve
    pub fn load_registry(&self) -> Result<Registry> {
        match &self.registry_path {
            Some(path) => load_registry_file(path),
            None => Ok(standard_registry()),
        }
    }
}

fn value(flag: &str, next: Option<String>) -> Result<String> {
    next.ok_or_else(|| Error::Config(format!("{flag} requires a value")))
}

fn parse_port(s: &str) -> Result<u16> {
    s.parse()
        .map_err(|_| Error::Config(format!("invalid port '{s}'")))
}

/// Read and validate a JSON [`RegistryDefinition`]
pub fn load_registry_file(path: &Path) -> Result<Registry> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    let def: RegistryDefinition = serde_json::from_str(&raw)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
    def.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(a: &[&str]) -> Vec<String> {
        a.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::parse(Vec::new(), no_env).unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_flags_override_env() {
        let env = |k: &str| match k {
            ENV_PORT => Some("4000".to_string()),
            ENV_BIND => Some("127.0.0.1".to_string()),
            _ => None,
        };
        let cfg = ServerConfig::parse(args(&["-p", "5000"]), env).unwrap();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.bind, "127.0.0.1");
    }

    #[test]
    fn test_bad_input() {
        assert!(ServerConfig::parse(args(&["--port", "nope"]), no_env).is_err());
        assert!(ServerConfig::parse(args(&["--port"]), no_env).is_err());
        assert!(ServerConfig::parse(args(&["--frobnicate"]), no_env).is_err());
    }

    #[test]
    fn test_help_flag() {
        assert!(ServerConfig::parse(args(&["-h"]), no_env).unwrap().help);
    }

    #[test]
    fn test_missing_registry_file() {
        let cfg = ServerConfig {
            registry_path: Some(PathBuf::from("/nonexistent/rolemask.json")),
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.load_registry(), Err(Error::Config(_))));
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rolemask-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_registry_file() {
        let path = write_temp(
            "valid",
            r#"{
                "wildcard": "ROOT",
                "permissions": [
                    { "name": "ROOT", "bit": 0 },
                    { "name": "POST", "bit": 1 },
                    { "name": "PIN_POST", "bit": 2, "depends_on": ["POST"] }
                ]
            }"#,
        );
        let cfg = ServerConfig {
            registry_path: Some(path.clone()),
            ..ServerConfig::default()
        };
        let reg = cfg.load_registry();
        std::fs::remove_file(&path).unwrap();

        let reg = reg.unwrap();
        assert_eq!(reg.get_all_permissions(), vec!["ROOT", "POST", "PIN_POST"]);
        assert_eq!(reg.get_permission("PIN_POST").unwrap().bit(), 2);
        assert_eq!(reg.wildcard().unwrap().name(), "ROOT");
        let post = reg.get_permission("POST").unwrap();
        assert_eq!(reg.permission_dependants(post), &["PIN_POST".to_string()]);
    }

    #[test]
    fn test_invalid_registry_file() {
        let path = write_temp(
            "unknown-dep",
            r#"{ "permissions": [ { "name": "A", "bit": 0, "depends_on": ["GHOST"] } ] }"#,
        );
        let result = load_registry_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            result.unwrap_err(),
            Error::Registry(RegistryError::UnknownDependency {
                permission: "A".into(),
                dependency: "GHOST".into(),
            })
        );

        let path = write_temp("malformed", "{ \"permissions\": 7 }");
        let result = load_registry_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_default_registry_is_standard() {
        let reg = ServerConfig::default().load_registry().unwrap();
        assert_eq!(reg.len(), standard_registry().len());
    }
}
