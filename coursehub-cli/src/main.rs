//! CourseHub CLI - Command-line interface for the course-enrollment service

use anyhow::Context;
use clap::{Parser, Subcommand};
use coursehub_api::{ApiClient, ApiClientConfig};
use coursehub_cli::actions::{self, Dashboard, Enrollment};
use coursehub_core::{
    init_logging, log_operation_error, ClientConfig, Course, CourseHubError, ErrorContext,
    LoggingConfig, SigninInput, SignupInput,
};
use coursehub_session::{FileStorage, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "coursehub")]
#[command(about = "Sign in, subscribe and enroll in courses from the terminal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides config and environment
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "COURSEHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in with email and password
    Signin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "COURSEHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is signed in
    Status {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start a subscription for the signed-in user
    Subscribe,

    /// List every course (subscribers only)
    Courses,

    /// List the courses you are enrolled in
    MyCourses,

    /// Enroll in a course
    Enroll {
        /// Course identifier
        course_id: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = load_config(cli.config.as_ref())?.apply_env()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = Some(base_url);
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    if cli.verbose {
        config.logging = LoggingConfig {
            format: config.logging.format,
            ..LoggingConfig::verbose()
        };
    }

    init_logging(&config.logging).map_err(|e| CourseHubError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the configuration"),
    })?;

    info!("Starting CourseHub CLI v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Config { show, init } => handle_config(&config, show, init),
        command => run_command(command, &config).await,
    }
}

/// Build the session store and API client for every command that talks to the backend
fn connect(config: &ClientConfig) -> anyhow::Result<(SessionStore, ApiClient)> {
    config.validate()?;

    let storage = FileStorage::new(config.storage.data_dir())?;
    debug!(dir = ?storage.storage_dir(), "Using session storage");
    let store = SessionStore::open(Arc::new(storage));
    let api = ApiClient::new(ApiClientConfig::from_api_config(&config.api)?, store.clone())?;

    Ok((store, api))
}

async fn run_command(command: Commands, config: &ClientConfig) -> anyhow::Result<()> {
    let (store, api) = connect(config)?;

    match command {
        Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            let details = SignupInput {
                first_name,
                last_name,
                email,
                password,
            };
            let user = actions::sign_up(&api, &store, details).await?;
            println!("✅ Welcome, {}!", user.display_name());
        }
        Commands::Signin { email, password } => {
            let user = actions::sign_in(&api, &store, SigninInput { email, password }).await?;
            println!("✅ Signed in as {}", user.display_name());
        }
        Commands::Logout => {
            actions::log_out(&api, &store).await?;
            println!("Signed out");
        }
        Commands::Status { json } => print_status(&store, json)?,
        Commands::Subscribe => match actions::subscribe(&api, &store).await.map_err(|e| {
            log_operation_error!("subscribe", e);
            e
        })? {
            Some(true) => println!("✅ Subscription active"),
            Some(false) => println!("Subscription request accepted but not active yet"),
            None => println!("Subscription request accepted"),
        },
        Commands::Courses => {
            let dashboard = actions::load_dashboard(&api, &store).await?;
            print_catalogue(&dashboard);
        }
        Commands::MyCourses => {
            let courses = actions::my_courses(&api, &store).await?;
            if courses.is_empty() {
                println!("You are not enrolled in any course yet");
            } else {
                println!("📚 Enrolled courses:");
                print_courses(&courses, |_| false);
            }
        }
        Commands::Enroll { course_id } => {
            let enrollment = actions::enroll(&api, &store, &course_id)
                .await
                .map_err(|e| {
                    log_operation_error!("enroll", e, course_id = %course_id);
                    e
                })?;
            println!("✅ Enrolled in {}", course_id);
            print_enrollment(&enrollment);
        }
        Commands::Config { show, init } => handle_config(config, show, init)?,
    }

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> anyhow::Result<ClientConfig> {
    if let Some(path) = config_path {
        info!("Loading configuration from {:?}", path);
        return Ok(ClientConfig::from_file(path)?);
    }

    let default_paths = [
        dirs::config_dir().map(|d| d.join("coursehub").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".coursehub").join("config.toml")),
        Some(PathBuf::from("coursehub.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            return Ok(ClientConfig::from_file(path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(ClientConfig::default())
}

fn handle_config(config: &ClientConfig, show: bool, init: bool) -> anyhow::Result<()> {
    if init {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
            .context("Could not determine a configuration directory")?
            .join("coursehub");

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {:?}", config_dir))?;
        let config_path = config_dir.join("config.toml");

        ClientConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
        println!("📝 Set api.base_url before signing in.");
    }

    if show || !init {
        println!("📋 Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    Ok(())
}

fn print_status(store: &SessionStore, json: bool) -> anyhow::Result<()> {
    let session = store.snapshot();

    if json {
        let value = serde_json::json!({
            "isAuthenticated": session.is_authenticated(),
            "user": session.user(),
            "refreshAttempted": session.refresh_attempted(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match session.user() {
        Some(user) => {
            println!("Signed in as {} <{}>", user.display_name(), user.email);
            println!(
                "Subscription: {}",
                if user.subscribed { "active" } else { "none" }
            );
            println!("Enrolled courses: {}", user.courses.len());
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

fn print_catalogue(dashboard: &Dashboard) {
    if dashboard.available.is_empty() {
        println!("No courses available");
        return;
    }
    println!("📚 Available courses:");
    print_courses(&dashboard.available, |course| {
        dashboard.is_enrolled(&course.id) || dashboard.user.is_enrolled(&course.id)
    });
}

fn print_enrollment(enrollment: &Enrollment) {
    match &enrollment.enrolled {
        Ok(courses) => {
            println!("📚 Enrolled courses:");
            print_courses(courses, |_| false);
        }
        Err(e) => println!("Could not refresh your course list: {}", e),
    }
}

fn print_courses<F>(courses: &[Course], enrolled: F)
where
    F: Fn(&Course) -> bool,
{
    for course in courses {
        let marker = if enrolled(course) { " [enrolled]" } else { "" };
        println!("  {}  {}{}", course.id, course.name, marker);
        if !course.description.is_empty() {
            println!("      {}", course.description);
        }
    }
}
