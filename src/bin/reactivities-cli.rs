use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use reactivities_sdk::models::{ActivityInput, RegisterRequest};
use reactivities_sdk::{ActivitiesClient, ClientError};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "reactivities-cli")]
#[command(about = "Command-line client for the Reactivities API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5001")]
    url: String,

    /// Bearer token from `login`.
    #[arg(short, long, env = "REACTIVITIES_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        display_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and print a bearer token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in user
    Whoami,
    /// List all activities
    List,
    /// Show one activity
    Show { id: String },
    /// Create an activity hosted by you
    Create(ActivityArgs),
    /// Replace the fields of an activity you host
    Edit {
        id: String,
        #[command(flatten)]
        fields: ActivityArgs,
    },
    /// Delete an activity you host
    Delete { id: String },
    /// Join or leave an activity, or toggle cancellation as its host
    Attend { id: String },
    /// Show a user's profile
    Profile { user_id: String },
}

#[derive(Args)]
struct ActivityArgs {
    #[arg(long)]
    title: String,
    /// RFC 3339 timestamp, e.g. 2030-01-01T19:00:00Z
    #[arg(long)]
    date: DateTime<Utc>,
    #[arg(long)]
    description: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    city: String,
    #[arg(long)]
    venue: String,
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,
    #[arg(long, allow_hyphen_values = true)]
    longitude: f64,
}

impl From<ActivityArgs> for ActivityInput {
    fn from(args: ActivityArgs) -> Self {
        Self {
            title: args.title,
            date: args.date,
            description: args.description,
            category: args.category,
            city: args.city,
            venue: args.venue,
            latitude: args.latitude,
            longitude: args.longitude,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut client = ActivitiesClient::new(&cli.url)?;
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    let result = run(&mut client, cli.command).await;
    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &mut ActivitiesClient, command: Commands) -> Result<(), ClientError> {
    match command {
        Commands::Register {
            display_name,
            email,
            password,
        } => {
            client
                .register(&RegisterRequest {
                    display_name,
                    email,
                    password,
                })
                .await?;
            println!("Registered");
        }
        Commands::Login { email, password } => print_json(&client.login(&email, &password).await?),
        Commands::Whoami => match client.user_info().await? {
            Some(user) => print_json(&user),
            None => println!("Not signed in"),
        },
        Commands::List => print_json(&client.list_activities().await?),
        Commands::Show { id } => print_json(&client.activity(&id).await?),
        Commands::Create(fields) => print_json(&client.create_activity(&fields.into()).await?),
        Commands::Edit { id, fields } => {
            client.edit_activity(&id, &fields.into()).await?;
            println!("Updated {}", id);
        }
        Commands::Delete { id } => {
            client.delete_activity(&id).await?;
            println!("Deleted {}", id);
        }
        Commands::Attend { id } => {
            client.attend(&id).await?;
            print_json(&client.activity(&id).await?);
        }
        Commands::Profile { user_id } => print_json(&client.profile(&user_id).await?),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: could not format response: {}", e),
    }
}

fn report(error: &ClientError) {
    match error {
        ClientError::Validation { errors } => {
            eprintln!("Error: validation failed");
            for (field, messages) in errors {
                for message in messages {
                    eprintln!("  {}: {}", field, message);
                }
            }
        }
        ClientError::Status { status: 401, .. } => {
            eprintln!("Error: not signed in (pass --token or set REACTIVITIES_TOKEN)")
        }
        ClientError::Status { status: 403, .. } => eprintln!("Error: only the host can do that"),
        other => eprintln!("Error: {}", other),
    }
}
