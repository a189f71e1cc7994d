use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "pro" => Some(Plan::Pro),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub plan: Plan,
    pub free_plan_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|_| format!("Invalid DATABASE_MAX_CONNECTIONS: {}", v))?,
            None => defaults.max_connections,
        };
        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| format!("Invalid PORT: {}", v))?,
            None => defaults.port,
        };

        let log_level = lookup("LOG_LEVEL")
            .unwrap_or(defaults.log_level)
            .to_lowercase();
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let plan = match lookup("PLAN") {
            Some(v) => Plan::parse(&v)
                .ok_or_else(|| format!("Invalid PLAN: {}. Must be free or pro", v))?,
            None => defaults.plan,
        };

        let free_plan_limit = match lookup("FREE_PLAN_LIMIT") {
            Some(v) => v
                .parse::<usize>()
                .map_err(|_| format!("Invalid FREE_PLAN_LIMIT: {}", v))?,
            None => defaults.free_plan_limit,
        };
        if free_plan_limit == 0 {
            return Err("FREE_PLAN_LIMIT must be greater than 0".to_string());
        }

        Ok(Self {
            database_url,
            max_connections,
            host,
            port,
            log_level,
            plan,
            free_plan_limit,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid HOST/PORT {}:{}: {}", self.host, self.port, e))
    }

    /// `None` means unlimited.
    pub fn bet_limit(&self) -> Option<usize> {
        match self.plan {
            Plan::Free => Some(self.free_plan_limit),
            Plan::Pro => None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://bettrack.db?mode=rwc".to_string(),
            max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            plan: Plan::Free,
            free_plan_limit: 15,
        }
    }
}
