use envconfig::Envconfig;

/// Service configuration. Image-host credentials are deliberately
/// environment-only; nothing here is ever embedded in source.
#[derive(Envconfig, Debug, Clone)]
pub struct Config {
    #[envconfig(from = "DATABASE_URL", default = "postgresql://localhost/lostfound")]
    pub database_url: String,

    #[envconfig(from = "LF_SERVER_PORT", default = "3000")]
    pub server_port: u16,

    #[envconfig(from = "LF_IMAGE_UPLOAD_URL", default = "https://api.cloudinary.com/v1_1/demo/image/upload")]
    pub image_upload_url: String,

    #[envconfig(from = "LF_IMAGE_UPLOAD_PRESET", default = "unsigned")]
    pub image_upload_preset: String,

    #[envconfig(from = "LF_IMAGE_FOLDER", default = "lostfound")]
    pub image_folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self, envconfig::Error> {
        Self::init_from_env()
    }
}
