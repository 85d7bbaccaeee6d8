// server/src/cli/commands.rs

// Command line arguments and subcommands for `pronto-server`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use models::{Permission, RecordId};

#[derive(Parser, Debug)]
#[clap(name = "pronto-server", version, about = "Emergency department triage service")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Option<ProntoCommands>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum ProntoCommands {
    /// Run the REST API (the default).
    Serve(ServeArgs),
    /// Create a user directly in the database, e.g. the first admin.
    CreateUser(CreateUserArgs),
}

/// Flags override the configuration file and `PRONTO_*` variables.
#[derive(Debug, Args, Default, PartialEq)]
pub struct ServeArgs {
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
    #[clap(long, short = 'p')]
    pub port: Option<u16>,
    #[clap(long)]
    pub host: Option<String>,
    #[clap(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Args, PartialEq)]
pub struct CreateUserArgs {
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,
    #[clap(long)]
    pub data_dir: Option<PathBuf>,
    #[clap(long)]
    pub name: String,
    #[clap(long)]
    pub surname: String,
    #[clap(long)]
    pub email: String,
    #[clap(long)]
    pub identity_code: String,
    #[clap(long, env = "PRONTO_USER_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[clap(long, value_parser = parse_permission)]
    pub permission: Permission,
    #[clap(long)]
    pub department_id: Option<RecordId>,
}

fn parse_permission(value: &str) -> Result<Permission, String> {
    value.parse::<Permission>().map_err(|e| format!("permission {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_serve_flags() {
        let args = CliArgs::try_parse_from(["pronto-server", "serve", "--port", "9000", "--data-dir", "/tmp/pronto"]).unwrap();
        assert_eq!(
            args.command,
            Some(ProntoCommands::Serve(ServeArgs {
                port: Some(9000),
                data_dir: Some(PathBuf::from("/tmp/pronto")),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn serve_is_optional() {
        let args = CliArgs::try_parse_from(["pronto-server"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn should_parse_create_user() {
        let args = CliArgs::try_parse_from([
            "pronto-server",
            "create-user",
            "--name",
            "Ada",
            "--surname",
            "Conti",
            "--email",
            "ada.conti@hospital.example",
            "--identity-code",
            "ADM-001",
            "--password",
            "first-admin-pass",
            "--permission",
            "admin",
        ])
        .unwrap();
        let Some(ProntoCommands::CreateUser(user)) = args.command else {
            panic!("expected create-user");
        };
        assert_eq!(user.permission, Permission::Admin);
        assert_eq!(user.department_id, None);
    }

    #[test]
    fn should_reject_unknown_permission() {
        let result = CliArgs::try_parse_from([
            "pronto-server",
            "create-user",
            "--name",
            "Ada",
            "--surname",
            "Conti",
            "--email",
            "ada@hospital.example",
            "--identity-code",
            "X1",
            "--password",
            "first-admin-pass",
            "--permission",
            "nurse",
        ]);
        assert!(result.is_err());
    }
}
