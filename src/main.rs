use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lorebook::cli::{
    CharacterCommands, ImageCommands, ShareFormat, UserCommands, run_character_list,
    run_character_show, run_export, run_image_add, run_import, run_info, run_init, run_migrate,
    run_open, run_share, run_user_add, run_user_list, run_user_remove,
};

#[derive(Parser)]
#[command(name = "lorebook")]
#[command(about = "Character wiki storage, backups and share links", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a wiki (create config and database)
    Init {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Browse characters
    Character {
        #[command(subcommand)]
        command: CharacterCommands,
    },

    /// Manage images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Write a full backup file
    Export {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Backup file to write (defaults to lorebook-backup-<date>.json)
        file: Option<String>,

        /// Leave images out of the backup
        #[arg(long)]
        no_images: bool,
    },

    /// Replace all data with a backup file
    Import {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Backup file to read
        file: String,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Print a share link for the world content
    Share {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Embed the compressed payload instead of uploading it
        #[arg(long, conflicts_with = "legacy")]
        inline: bool,

        /// Embed an uncompressed payload readable by older builds
        #[arg(long)]
        legacy: bool,
    },

    /// Import the data a share link points at
    Open {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Share link
        url: String,
    },

    /// Upgrade stored characters to the current format
    Migrate {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Show wiki status information
    Info {
        /// Data directory for config and database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("lorebook=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            data_dir,
            non_interactive,
        } => run_init(data_dir, non_interactive)?,
        Commands::User { command } => match command {
            UserCommands::Add {
                data_dir,
                username,
                password,
                non_interactive,
            } => run_user_add(data_dir, username, password, non_interactive)?,
            UserCommands::List { data_dir, json } => run_user_list(data_dir, json)?,
            UserCommands::Remove {
                data_dir,
                username,
                non_interactive,
                yes,
            } => run_user_remove(data_dir, username, non_interactive, yes)?,
        },
        Commands::Character { command } => match command {
            CharacterCommands::List {
                data_dir,
                category,
                json,
            } => run_character_list(data_dir, category, json)?,
            CharacterCommands::Show { data_dir, id } => run_character_show(data_dir, id)?,
        },
        Commands::Image { command } => match command {
            ImageCommands::Add {
                data_dir,
                file,
                set,
            } => run_image_add(data_dir, file, set).await?,
        },
        Commands::Export {
            data_dir,
            file,
            no_images,
        } => run_export(data_dir, file, no_images).await?,
        Commands::Import {
            data_dir,
            file,
            non_interactive,
            yes,
        } => run_import(data_dir, file, non_interactive, yes).await?,
        Commands::Share {
            data_dir,
            inline,
            legacy,
        } => {
            let format = if inline {
                ShareFormat::Inline
            } else if legacy {
                ShareFormat::Legacy
            } else {
                ShareFormat::Hosted
            };
            run_share(data_dir, format).await?;
        }
        Commands::Open { data_dir, url } => run_open(data_dir, url).await?,
        Commands::Migrate { data_dir } => run_migrate(data_dir)?,
        Commands::Info { data_dir, json } => run_info(data_dir, json).await?,
    }

    Ok(())
}
