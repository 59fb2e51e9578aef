use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use heyllm::app::{App, RunOptions};
use heyllm::commands::COMMANDS;
use heyllm::config::Config;
use heyllm::dispatch;
use heyllm::display;
use heyllm::session::{self, ParamOverrides};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let mut command = Command::new("hey")
        .about("Preset prompts for a language model, from your shell")
        .long_about(
            "Sends your text through a preset prompt (shell, code, regex, rephrase, chat), prints the \
             reply and copies it to the clipboard. Without a command, the text continues the last \
             conversation.",
        )
        .arg(Arg::new("words")
            .help("Optional command name followed by your text")
            .num_args(1..)
            .trailing_var_arg(true))
        .arg(Arg::new("overwrite")
            .short('o')
            .long("overwrite")
            .help("Replace the previous follow-up instead of appending to the conversation")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("model")
            .short('m')
            .long("model")
            .help("Model to use instead of the command's default")
            .value_name("MODEL")
            .num_args(1))
        .arg(Arg::new("temperature")
            .short('t')
            .long("temperature")
            .help("Sampling temperature, from 0 to 2")
            .value_name("TEMP")
            .value_parser(session::parse_temperature)
            .num_args(1))
        .arg(Arg::new("max-tokens")
            .long("max-tokens")
            .help("Maximum tokens in the reply")
            .value_name("N")
            .value_parser(clap::value_parser!(u32))
            .num_args(1))
        .arg(Arg::new("no-copy")
            .long("no-copy")
            .help("Do not copy the reply to the clipboard")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Log what is happening to stderr")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("show")
            .long("show")
            .help("Print the stored conversation")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("reset")
            .long("reset")
            .help("Forget the stored conversation")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("list")
            .long("list")
            .help("List the available commands")
            .action(ArgAction::SetTrue))
        .arg(Arg::new("set-api-key")
            .long("set-api-key")
            .help("Save the OpenAI API key")
            .value_name("API_KEY")
            .num_args(1))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(ArgAction::SetTrue));

    // one selector flag per command-table entry
    for spec in COMMANDS {
        command = command.arg(Arg::new(spec.name)
            .long(spec.name)
            .help(spec.summary)
            .help_heading("Commands")
            .action(ArgAction::SetTrue));
    }
    command
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn overrides(matches: &ArgMatches) -> ParamOverrides {
    ParamOverrides {
        model: matches.get_one::<String>("model").cloned(),
        temperature: matches.get_one::<f32>("temperature").copied(),
        max_tokens: matches.get_one::<u32>("max-tokens").copied(),
    }
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    if let Some(api_key) = matches.get_one::<String>("set-api-key") {
        let mut config = Config::load()?;
        config.set_api_key(api_key.clone())?;
        println!("✅ API key saved successfully");
        return Ok(());
    }

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(());
    }

    if matches.get_flag("list") {
        display::print_command_table(&mut std::io::stdout())?;
        return Ok(());
    }

    let config = Config::load()?;
    let copy = config.copy_to_clipboard && !matches.get_flag("no-copy");
    let mut app = App::new(config)?;

    if matches.get_flag("reset") {
        app.reset_session()?;
        println!("Conversation cleared");
        return Ok(());
    }

    if matches.get_flag("show") {
        app.show_session(&mut std::io::stdout())?;
        return Ok(());
    }

    let flags: Vec<&'static str> = COMMANDS
        .iter()
        .filter(|spec| matches.get_flag(spec.name))
        .map(|spec| spec.name)
        .collect();
    let words: Vec<String> = matches
        .get_many::<String>("words")
        .unwrap_or_default()
        .cloned()
        .collect();

    let invocation = dispatch::resolve(&flags, &words)?;
    info!("Resolved invocation: {:?}", invocation);

    let options = RunOptions {
        overwrite: matches.get_flag("overwrite"),
        overrides: overrides(&matches),
        copy,
    };
    app.run(invocation, &options).await
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = run(matches).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
