//! verdent_trial - command-line front end for the trial client

use clap::{Parser, Subcommand, ValueEnum};

use verdent_trial::client::{ClientOptions, Eligibility, TrialOptions, VerdentClient, TRIAL_SOURCE};
use verdent_trial::config::get_config;
use verdent_trial::device::{
    generate_device_id, generate_device_id_custom, generate_random_machine_id,
};
use verdent_trial::errors::{TrialError, TrialResult};
use verdent_trial::logging::init_logging;
use verdent_trial::settings::ProxySettings;

#[derive(Parser)]
#[command(name = "verdent_trial")]
#[command(about = "Fetch Verdent account state and free-trial checkout links", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Auth token (the value of the `token` cookie)
    #[arg(long, env = "VERDENT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Proxy URL, e.g. http://127.0.0.1:7890 or socks5://127.0.0.1:1080
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Trace every request and response
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a freshly generated device id
    DeviceId {
        #[arg(long, value_enum, default_value_t = IdFormat::Uuid)]
        format: IdFormat,
    },

    /// Manage the saved proxy settings
    Proxy {
        #[command(subcommand)]
        action: ProxyAction,
    },

    #[command(flatten)]
    Account(AccountCommand),
}

/// Commands that talk to the Verdent service.
#[derive(Subcommand)]
enum AccountCommand {
    /// Show account and trial eligibility state
    Info,

    /// Run the full free-trial flow and print the checkout URL
    Trial {
        /// Device id to send (generated when omitted)
        #[arg(long)]
        device_id: Option<String>,

        /// Stop if the server reports the trial as unavailable
        #[arg(long)]
        check_eligibility: bool,
    },

    /// Create a subscription for an explicit plan id
    Subscribe {
        #[arg(long)]
        plan_id: String,

        #[arg(long)]
        device_id: Option<String>,

        #[arg(long, default_value = TRIAL_SOURCE)]
        source: String,
    },

    /// Exchange a PKCE authorization code for a token
    Pkce {
        #[arg(long)]
        code: String,

        #[arg(long)]
        verifier: String,
    },
}

#[derive(Subcommand)]
enum ProxyAction {
    /// Print the saved settings
    Show,
    /// Save a proxy URL and enable it
    Set { url: String },
    /// Enable the saved proxy
    Enable,
    /// Disable the saved proxy
    Disable,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IdFormat {
    /// Standard random UUID
    Uuid,
    /// xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx template
    Custom,
    /// 32 hex digits
    Machine,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        if e.is_network() {
            eprintln!("hint: check the proxy setting and that the proxy is running");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> TrialResult<()> {
    let config = get_config()?;
    let debug = config.debug_enabled(cli.debug);
    init_logging(&config.effective_logging(cli.debug));

    match cli.command {
        Commands::DeviceId { format } => {
            let id = match format {
                IdFormat::Uuid => generate_device_id(),
                IdFormat::Custom => generate_device_id_custom(),
                IdFormat::Machine => generate_random_machine_id(),
            };
            println!("{id}");
            Ok(())
        }
        Commands::Proxy { action } => run_proxy(action),
        Commands::Account(command) => {
            let proxy = resolve_proxy(cli.proxy, config.proxy.url.clone())?;
            let options = ClientOptions::from(&config.api)
                .with_proxy(proxy)
                .with_debug(debug);
            let mut client = VerdentClient::new(options)?;

            if let Some(token) = cli.token {
                client.set_auth_token(token);
            }

            run_account(&mut client, command).await
        }
    }
}

async fn run_account(client: &mut VerdentClient, command: AccountCommand) -> TrialResult<()> {
    match command {
        AccountCommand::Info => {
            let info = client.get_user_info().await?;
            println!("email:              {}", info.email.as_deref().unwrap_or("-"));
            println!("trial plan id:      {}", info.trial_plan_id().unwrap_or("-"));
            println!("is subscribed:      {}", flag(info.is_subscribe));
            println!("trial available:    {}", info.trial_available());
            if let Some(bonus) = &info.subscription_bonus {
                println!(
                    "subscription bonus: {}",
                    serde_json::to_string(bonus).unwrap_or_default()
                );
            }
        }
        AccountCommand::Trial {
            device_id,
            check_eligibility,
        } => {
            let eligibility = if check_eligibility {
                Eligibility::Enforce
            } else {
                Eligibility::Bypass
            };
            let mut options = TrialOptions::new(eligibility);
            options.device_id = device_id;
            let url = client.get_free_trial_page(options).await?;
            println!("{url}");
        }
        AccountCommand::Subscribe {
            plan_id,
            device_id,
            source,
        } => {
            let result = client
                .create_subscription(&plan_id, device_id.as_deref(), &source)
                .await?;
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| TrialError::Decode(e.to_string()))?;
            println!("{json}");
        }
        AccountCommand::Pkce { code, verifier } => {
            let token = client.pkce_callback(&code, &verifier).await?;
            println!("{token}");
        }
    }

    Ok(())
}

/// `--proxy` wins, then config/env, then the saved settings file.
fn resolve_proxy(flag: Option<String>, configured: Option<String>) -> TrialResult<Option<String>> {
    if let Some(url) = flag.or(configured) {
        return Ok(Some(url));
    }
    let settings = ProxySettings::load()?;
    Ok(settings.active_proxy().map(str::to_string))
}

fn run_proxy(action: ProxyAction) -> TrialResult<()> {
    let mut settings = ProxySettings::load()?;

    match action {
        ProxyAction::Show => {
            println!("enabled: {}", settings.enabled);
            println!("url:     {}", settings.url);
            return Ok(());
        }
        ProxyAction::Set { url } => {
            verdent_trial::client::proxy::ProxyRoutes::parse(&url)?;
            settings.url = url;
            settings.enabled = true;
        }
        ProxyAction::Enable => settings.enabled = true,
        ProxyAction::Disable => settings.enabled = false,
    }

    settings.save()?;
    println!(
        "proxy {} ({})",
        if settings.enabled { "enabled" } else { "disabled" },
        settings.url
    );
    Ok(())
}

fn flag(value: Option<bool>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
