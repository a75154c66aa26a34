use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum UserCommands {
    /// Add a new account (the first account becomes the admin)
    Add {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username for the new account
        #[arg(long)]
        username: Option<String>,

        /// Password for the new account (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Skip interactive prompts (requires --username and --password)
        #[arg(long)]
        non_interactive: bool,
    },

    /// List accounts
    List {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an account
    Remove {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Username to remove
        #[arg(long)]
        username: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum CharacterCommands {
    /// List characters, upgrading stored records as they are read
    List {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Only list this category (e.g. "allies", "main-protagonist")
        #[arg(long)]
        category: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one character as JSON
    Show {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Character id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ImageCommands {
    /// Store an image file and print its key
    Add {
        /// Data directory holding the wiki database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Image file to store
        file: String,

        /// Also use the image for this slot
        #[arg(long, value_enum)]
        set: Option<ImageSlot>,
    },
}

/// Settings that hold a single image key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageSlot {
    Logo,
    AuthBanner,
    SynopsisBanner,
    HomeBackground,
    CharactersBackground,
}
