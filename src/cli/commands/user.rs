use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::database::models::{UserInput, UserProfile};
use crate::services::UserService;
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user with an initial password")]
    Create {
        #[arg(long, help = "Login name")]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long = "role", help = "Role to grant, repeatable (e.g. ADMIN, FINANCE_HOLDING)")]
        roles: Vec<Role>,
    },

    #[command(about = "Grant a role to an existing user")]
    Grant {
        #[arg(help = "Login name")]
        username: String,

        #[arg(help = "Role name, with or without the ROLE_ prefix")]
        role: Role,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = UserService::new().await?;

    let profile = match cmd {
        UserCommands::Create {
            username,
            email,
            password,
            roles,
        } => {
            service
                .create(UserInput {
                    username,
                    email,
                    password: Some(password),
                    first_name: None,
                    last_name: None,
                    enabled: Some(true),
                    roles,
                })
                .await?
        }
        UserCommands::Grant { username, role } => {
            let user = service
                .find_by_username(&username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("user '{}' not found", username))?;
            service.grant_role(user.id, role).await?
        }
    };

    output_format.emit(&profile, print_profile)
}

fn print_profile(profile: &UserProfile) {
    println!("{:<8} {:<20} {:<30} ROLES", "ID", "USERNAME", "EMAIL");
    println!("{:<8} {:<20} {:<30} {}", profile.id, profile.username, profile.email, profile.roles.join(","));
}
