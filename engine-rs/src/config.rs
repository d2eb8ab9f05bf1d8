use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub log_format: String,
    pub storage: StorageConfig,
    pub timers: TimerConfig,
    pub schedule: ScheduleConfig,
    pub fees: FeeConfig,
    pub limits: LimitConfig,
    pub admin: AdminConfig,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ephemeral: bool,
}

#[derive(Clone, Debug)]
pub struct TimerConfig {
    pub backup_interval_secs: u64,
    pub scheduler_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    /// Offset of the reference timezone from UTC, in minutes (Nepal: +345).
    pub utc_offset_minutes: i32,
    pub open_hour: u32,
    pub close_hour: u32,
}

#[derive(Clone, Debug)]
pub struct FeeConfig {
    pub team_create: i64,
    pub team_join: i64,
}

#[derive(Clone, Debug)]
pub struct LimitConfig {
    pub team_max_members: usize,
    pub min_password_len: usize,
    pub min_username_len: usize,
    pub popup_window_secs: i64,
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub id: String,
    pub name: String,
    pub email: String,
    pub identifier: String,
    pub password: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_format: env_or("LOG_FORMAT", "pretty"),
            storage: StorageConfig {
                data_dir: PathBuf::from(env_or("GAMEPORT_DATA_DIR", "./gameport-data")),
                ephemeral: env_or_parse("GAMEPORT_EPHEMERAL", false),
            },
            timers: TimerConfig {
                backup_interval_secs: env_or_parse("BACKUP_INTERVAL_SECS", 30),
                scheduler_interval_secs: env_or_parse("SCHEDULER_INTERVAL_SECS", 60),
            },
            schedule: ScheduleConfig {
                utc_offset_minutes: env_or_parse("SCHEDULE_UTC_OFFSET_MINUTES", 345),
                open_hour: env_or_parse("SCHEDULE_OPEN_HOUR", 10),
                close_hour: env_or_parse("SCHEDULE_CLOSE_HOUR", 17),
            },
            fees: FeeConfig {
                team_create: env_or_parse("TEAM_CREATE_FEE", 20),
                team_join: env_or_parse("TEAM_JOIN_FEE", 5),
            },
            limits: LimitConfig {
                team_max_members: 4,
                min_password_len: 6,
                min_username_len: 3,
                popup_window_secs: 3600,
            },
            admin: AdminConfig {
                id: "admin_001".to_string(),
                name: "GamePort Admin".to_string(),
                email: env_or("ADMIN_EMAIL", "admin@gameport.np"),
                identifier: "admin".to_string(),
                password: env_or("ADMIN_PASSWORD", "admin"),
            },
        }
    }
}

impl Default for Config {
    /// Built-in defaults, ignoring the environment.
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            storage: StorageConfig {
                data_dir: PathBuf::from("./gameport-data"),
                ephemeral: true,
            },
            timers: TimerConfig {
                backup_interval_secs: 30,
                scheduler_interval_secs: 60,
            },
            schedule: ScheduleConfig {
                utc_offset_minutes: 345,
                open_hour: 10,
                close_hour: 17,
            },
            fees: FeeConfig {
                team_create: 20,
                team_join: 5,
            },
            limits: LimitConfig {
                team_max_members: 4,
                min_password_len: 6,
                min_username_len: 3,
                popup_window_secs: 3600,
            },
            admin: AdminConfig {
                id: "admin_001".to_string(),
                name: "GamePort Admin".to_string(),
                email: "admin@gameport.np".to_string(),
                identifier: "admin".to_string(),
                password: "admin".to_string(),
            },
        }
    }
}
