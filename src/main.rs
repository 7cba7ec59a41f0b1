use galaxy::{AppError, Galaxy};

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("galaxy=info"))
        .init();

    Galaxy::new().run()
}
