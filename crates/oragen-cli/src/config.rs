use oragen::{SharedValueStore, StatementKind, TableRef};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXPORT_OUTPUT: &str = "./oracle_merge_exports/merge_export.sql";
pub const DEFAULT_DELETE_OUTPUT: &str = "./oracle_delete_statements/delete_statements.sql";

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub config_dir: PathBuf,
    pub file: ConfigFile,
    pub tables: Vec<TableRef>,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;
        Self::from_toml(config_path, &raw)
    }

    pub fn from_toml(config_path: PathBuf, raw: &str) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let mut file: ConfigFile = toml::from_str(raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.expand_env()?;
        let tables = file.validate()?;

        Ok(Self {
            config_path,
            config_dir,
            file,
            tables,
        })
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    /// Output file: command-line override, then `[output] file` (relative to
    /// the config file), then the per-command default (relative to the
    /// working directory).
    pub fn output_path(&self, kind: StatementKind, cli_override: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_override {
            return p.to_path_buf();
        }
        if let Some(file) = self.file.output.file.as_deref() {
            return self.resolve_path(file);
        }
        PathBuf::from(match kind {
            StatementKind::Merge => DEFAULT_EXPORT_OUTPUT,
            StatementKind::Delete => DEFAULT_DELETE_OUTPUT,
        })
    }

    pub fn shared_values(&self) -> SharedValueStore {
        SharedValueStore::from_pairs(
            self.file
                .shared_values
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_string())),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub tables: Vec<String>,

    pub database: DatabaseConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub shared_values: BTreeMap<String, SharedValue>,
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub dsn: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("dsn", &self.dsn)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub file: Option<String>,
}

/// A `[shared_values]` entry. TOML numbers are accepted as well as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SharedValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for SharedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        self.database.username = expand_env_vars(&self.database.username)?;
        self.database.password = expand_env_vars(&self.database.password)?;
        self.database.dsn = expand_env_vars(&self.database.dsn)?;

        for t in &mut self.tables {
            *t = expand_env_vars(t)?;
        }

        if let Some(file) = self.output.file.as_mut() {
            *file = expand_env_vars(file)?;
        }

        for v in self.shared_values.values_mut() {
            if let SharedValue::Text(s) = v {
                *s = expand_env_vars(s)?;
            }
        }

        Ok(())
    }

    /// Check required fields and parse the table list. Blank table entries
    /// are ignored.
    fn validate(&self) -> anyhow::Result<Vec<TableRef>> {
        if self.database.username.trim().is_empty() {
            anyhow::bail!("database.username must not be empty");
        }
        if self.database.password.is_empty() {
            anyhow::bail!("database.password must not be empty");
        }
        if self.database.dsn.trim().is_empty() {
            anyhow::bail!("database.dsn must not be empty");
        }
        if let Some(file) = &self.output.file {
            if file.trim().is_empty() {
                anyhow::bail!("output.file must not be empty when set");
            }
        }

        let tables = self
            .tables
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| TableRef::parse(t).map_err(|e| anyhow::anyhow!("tables: {e}")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if tables.is_empty() {
            anyhow::bail!("tables must list at least one OWNER.TABLE entry");
        }

        Ok(tables)
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
