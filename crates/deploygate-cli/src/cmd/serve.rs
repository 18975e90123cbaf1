use clap::Args;
use deploygate_core::config::Config;
use tokio::sync::watch;

/// Flags that override values from the config file.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on (host:port)
    #[arg(long)]
    pub listen: Option<String>,

    /// Slack bot token used to post reviewer prompts
    #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
    pub slack_bot_token: Option<String>,

    /// Slack signing secret used to verify interaction callbacks
    #[arg(long, env = "SLACK_SIGNING_SECRET", hide_env_values = true)]
    pub slack_signing_secret: Option<String>,

    /// Channel reviewer prompts are posted to
    #[arg(long)]
    pub reviewer_channel: Option<String>,

    /// NATS server for outcome broadcasts
    #[arg(long, env = "NATS_URL")]
    pub nats_url: Option<String>,
}

impl ServeArgs {
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(token) = self.slack_bot_token {
            config.slack.bot_token = Some(token);
        }
        if let Some(secret) = self.slack_signing_secret {
            config.slack.signing_secret = Some(secret);
        }
        if let Some(channel) = self.reviewer_channel {
            config.reviewer.channel = channel;
        }
        if let Some(url) = self.nats_url {
            config.broadcast.nats_url = Some(url);
        }
        config
    }
}

pub fn run(config: Config, args: ServeArgs) -> anyhow::Result<()> {
    let config = args.apply(config);
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let (stop, shutdown) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received");
                let _ = stop.send(true);
            }
        });
        deploygate_server::serve(&config, shutdown).await
    })
}
