use std::time::Duration;

use futures::future::join_all;
use tvplayer_rs::{
    auth::Credentials,
    resolver::{
        Resolution, ResolutionRequest, ResolveError, Resolver, Unresolved, DEFAULT_SERVICE_ID,
    },
    util::{ClientConfig, HttpClient},
};

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

async fn resolve_one(
    resolver: &Resolver<HttpClient>,
    url: &str,
    credentials: Option<&Credentials>,
    service_id: u32,
) -> Result<Resolution, ResolveError> {
    let mut request = ResolutionRequest::parse(url)?.with_service(service_id);
    if let Some(credentials) = credentials {
        request = request.with_credentials(credentials.clone());
    }

    resolver.resolve(&request).await
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Read urls from args
    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("Usage: tvplayer-rs <watch page url>...");
        std::process::exit(2);
    }

    let mut config = ClientConfig::default();
    if let Some(secs) = env_var("TVPLAYER_TIMEOUT_SECS") {
        let secs = secs.parse().expect("TVPLAYER_TIMEOUT_SECS must be a number");
        config.timeout = Duration::from_secs(secs);
    }

    let service_id = env_var("TVPLAYER_SERVICE")
        .map(|s| s.parse().expect("TVPLAYER_SERVICE must be a number"))
        .unwrap_or(DEFAULT_SERVICE_ID);

    let credentials = match (env_var("TVPLAYER_EMAIL"), env_var("TVPLAYER_PASSWORD")) {
        (Some(email), Some(password)) => Some(Credentials::new(email, password)),
        _ => None,
    };

    // Fresh session per URL so cookies never leak between flows
    let resolvers: Vec<Resolver<HttpClient>> = urls
        .iter()
        .map(|_| Resolver::with_config(&config).expect("Could not create HttpClient"))
        .collect();

    let results = join_all(
        resolvers
            .iter()
            .zip(&urls)
            .map(|(resolver, url)| resolve_one(resolver, url, credentials.as_ref(), service_id)),
    )
    .await;

    let mut failed = false;
    for (url, result) in urls.iter().zip(results) {
        println!("{}", url);
        match result {
            Ok(Resolution::Resolved { variants, .. }) => {
                for v in variants {
                    println!("  {:>10}  {:>8} kbps  {}", v.name, v.bandwidth / 1000, v.url);
                }
            }
            Ok(Resolution::Unresolved(reason)) => {
                println!("  unresolved: {} ({})", reason, reason.guidance());
                if reason == Unresolved::NeedsLogin && credentials.is_none() {
                    println!("  set TVPLAYER_EMAIL and TVPLAYER_PASSWORD to login");
                }
            }
            Err(e) => {
                failed = true;
                match e.stage() {
                    Some(stage) => println!("  failed at {}: {}", stage, e),
                    None => println!("  failed: {}", e),
                }
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
