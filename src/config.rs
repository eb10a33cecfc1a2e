use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub owner_name: String,
    pub admin_username: String,
    pub admin_password: String,
    pub trust_threshold: i64,
    pub public_rps: u32,
    pub admin_rps: u32,
    pub geo_lookup_url: String,
}

/// One `{question, answer}` pair for the verification quiz. Answers are
/// matched trimmed and case-insensitively; the set is compiled in and never
/// persisted.
#[derive(Debug, Clone, Copy)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const QUIZ_QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "Apa produk utama yang dijual di toko ini?",
        answer: "kripik",
    },
    QuizQuestion {
        question: "Apa nama toko ini?",
        answer: "kripikwasyif",
    },
    QuizQuestion {
        question: "Lewat aplikasi apa pembeli menghubungi penjual?",
        answer: "whatsapp",
    },
    QuizQuestion {
        question: "Berapa langkah verifikasi sebelum halaman login?",
        answer: "2",
    },
];

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            owner_name: get_env("OWNER_NAME")?,
            admin_username: get_env("ADMIN_USERNAME")?,
            admin_password: get_env("ADMIN_PASSWORD")?,
            trust_threshold: get_env_parse_or("TRUST_THRESHOLD", 3)?,
            public_rps: get_env_parse("PUBLIC_RPS")?,
            admin_rps: get_env_parse("ADMIN_RPS")?,
            geo_lookup_url: env::var("GEO_LOOKUP_URL")
                .unwrap_or_else(|_| "http://ip-api.com/json".to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    raw.parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
