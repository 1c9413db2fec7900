use std::process::ExitCode;

const USAGE: &str = "usage: lifelink [serve | grant-admin <email>]";

#[tokio::main]
async fn main() -> ExitCode {
    lifelink_lib::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["serve"] => lifelink_lib::run().await,
        ["grant-admin", email] => lifelink_lib::grant_admin(email),
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
