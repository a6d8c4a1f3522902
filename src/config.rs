use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub public_base_url: String,
    pub paytech: PaytechConfig,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Debug, Clone)]
pub struct PaytechConfig {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let paytech = PaytechConfig {
            api_key: env::var("PAYTECH_API_KEY").ok(),
            secret_key: env::var("PAYTECH_SECRET_KEY").ok(),
            base_url: env::var("PAYTECH_BASE_URL")
                .unwrap_or_else(|_| "https://paytech.sn".to_string()),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").ok(),
            api_key: env::var("CLOUDINARY_API_KEY").ok(),
            api_secret: env::var("CLOUDINARY_API_SECRET").ok(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            public_base_url,
            paytech,
            cloudinary,
        })
    }
}
