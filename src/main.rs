use clap::Parser;
use envbox::cli::{init_logging, Cli, Commands, KeyAction};
use envbox::errors::EnvBoxError;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Add {
            ref name,
            ref exposed,
            ref file,
            multi,
        } => envbox::cli::commands::add::execute(name, exposed.as_deref(), file.as_deref(), multi),
        Commands::List { values } => envbox::cli::commands::list::execute(values),
        Commands::Show { ref name, export } => envbox::cli::commands::show::execute(name, export),
        Commands::Remove { ref name } => envbox::cli::commands::remove::execute(name),
        Commands::Run {
            ref env,
            shell,
            ref command,
        } => envbox::cli::commands::run::execute(env, shell, command),
        Commands::Key { ref action } => match action {
            KeyAction::Generate { set } => envbox::cli::commands::key::execute_generate(*set),
            KeyAction::Set => envbox::cli::commands::key::execute_set(),
            KeyAction::Clear => envbox::cli::commands::key::execute_clear(),
        },
        Commands::Completions { shell } => envbox::cli::commands::completions::execute(shell),
    };

    match result {
        Ok(()) => {}
        // The child already reported whatever went wrong.
        Err(EnvBoxError::ChildProcessFailed(code)) => std::process::exit(code),
        Err(e) => {
            envbox::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    }
}
