//! Interactive terminal front end.
//!
//! Two panels mirror the tabs of the web page: `converse` submits plain lines
//! to the chat session, `knowledge-base` manages uploaded documents. Lines
//! starting with `:` are commands available in both panels.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use vta_chat::{SessionController, SubmitOutcome, UploadFile, UploadRegistry};
use vta_core::{Message, Role};

pub const TITLE: &str = "Clemson Virtual TA";

/// Which tab is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Converse,
    KnowledgeBase,
}

impl Panel {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "converse" | "chat" => Some(Panel::Converse),
            "knowledge-base" | "kb" => Some(Panel::KnowledgeBase),
            _ => None,
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            Panel::Converse => "you> ",
            Panel::KnowledgeBase => "kb> ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AugmentSwitch {
    On,
    Off,
    Toggle,
}

/// A parsed input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Tab(Panel),
    Augment(AugmentSwitch),
    History,
    Files,
    Help,
    Quit,
    Say(String),
    Upload(Vec<PathBuf>),
    Delete(String),
    Unknown(String),
    Empty,
}

/// Interpret one line of input for the active panel.
pub fn parse_command(panel: Panel, line: &str) -> Command {
    let trimmed = line.trim();
    if let Some(meta) = trimmed.strip_prefix(':') {
        return parse_meta(meta);
    }

    match panel {
        // Chat text is passed through untouched; the session ignores blanks.
        Panel::Converse => Command::Say(line.trim_end_matches(['\r', '\n']).to_string()),
        Panel::KnowledgeBase => {
            let (verb, rest) = split_verb(trimmed);
            match verb {
                "" => Command::Empty,
                "upload" if !rest.is_empty() => {
                    Command::Upload(split_paths(rest).into_iter().map(PathBuf::from).collect())
                }
                "delete" if !rest.is_empty() => Command::Delete(unquote(rest).to_string()),
                "list" => Command::Files,
                _ => Command::Unknown(trimmed.to_string()),
            }
        }
    }
}

fn parse_meta(meta: &str) -> Command {
    let (verb, rest) = split_verb(meta.trim());
    match verb {
        "tab" => Panel::parse(rest)
            .map(Command::Tab)
            .unwrap_or_else(|| Command::Unknown(format!(":{}", meta))),
        "augment" => match rest {
            "on" => Command::Augment(AugmentSwitch::On),
            "off" => Command::Augment(AugmentSwitch::Off),
            "" | "toggle" => Command::Augment(AugmentSwitch::Toggle),
            _ => Command::Unknown(format!(":{}", meta)),
        },
        "history" => Command::History,
        "files" => Command::Files,
        "help" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(format!(":{}", meta)),
    }
}

fn split_verb(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (s, ""),
    }
}

/// Split on whitespace, keeping `"..."` or `'...'` spans together.
///
/// An unterminated quote runs to the end of the line.
fn split_paths(s: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in s.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_token = true;
            }
            None if c.is_whitespace() => {
                if in_token {
                    paths.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        paths.push(current);
    }
    paths
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

/// One transcript line as shown in the terminal.
pub fn format_message(message: &Message) -> String {
    let label = match message.role {
        Role::User => "you",
        Role::Assistant => "ta",
        Role::System => "system",
    };
    format!("{:>6} | {}", label, message.content)
}

pub fn help_text(panel: Panel) -> String {
    let panel_help = match panel {
        Panel::Converse => "  <text>                 ask the TA\n",
        Panel::KnowledgeBase => {
            "  upload <path>...       add documents (.pdf .txt .doc .docx)\n\
             \x20 delete <name>          remove a document\n\
             \x20 list                   show documents\n"
        }
    };
    format!(
        "{}\
         \x20 :tab converse|kb       switch panel\n\
         \x20 :augment on|off|toggle use the knowledge base when answering\n\
         \x20 :history               show the conversation\n\
         \x20 :files                 show documents\n\
         \x20 :help                  this text\n\
         \x20 :quit                  leave",
        panel_help
    )
}

/// Terminal session bound to one chat session and one registry.
pub struct Console {
    session: Arc<SessionController>,
    registry: Arc<UploadRegistry>,
    panel: Panel,
}

enum Flow {
    Continue,
    Exit,
}

impl Console {
    pub fn new(session: Arc<SessionController>, registry: Arc<UploadRegistry>) -> Self {
        Self {
            session,
            registry,
            panel: Panel::Converse,
        }
    }

    /// Read stdin until EOF or `:quit`.
    ///
    /// A chat turn is awaited before the next line is read, so input is
    /// effectively disabled while a reply is pending.
    pub async fn run(mut self) -> std::io::Result<()> {
        println!("{}", TITLE);
        println!("Type :help for commands.\n");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print_prompt(self.panel);
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if let Flow::Exit = self.handle(parse_command(self.panel, &line)).await {
                break;
            }
        }

        tracing::info!(session = %self.session.id(), "Console closed");
        Ok(())
    }

    async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Exit,
            Command::Empty => {}
            Command::Help => println!("{}", help_text(self.panel)),
            Command::Tab(panel) => {
                self.panel = panel;
                match panel {
                    Panel::Converse => println!("-- Converse --"),
                    Panel::KnowledgeBase => println!("-- Knowledge Base Management --"),
                }
            }
            Command::Augment(switch) => {
                let enabled = match switch {
                    AugmentSwitch::On => {
                        self.session.set_augment(true);
                        true
                    }
                    AugmentSwitch::Off => {
                        self.session.set_augment(false);
                        false
                    }
                    AugmentSwitch::Toggle => self.session.toggle_augment(),
                };
                println!(
                    "Use knowledge base: {}",
                    if enabled { "on" } else { "off" }
                );
            }
            Command::History => {
                for message in self.session.transcript().messages() {
                    println!("{}", format_message(message));
                }
            }
            Command::Files => {
                let files = self.registry.files();
                if files.is_empty() {
                    println!("No documents uploaded.");
                }
                for file in files {
                    println!("  {}", file);
                }
            }
            Command::Say(text) => self.say(&text).await,
            Command::Upload(paths) => self.spawn_upload(paths),
            Command::Delete(name) => self.spawn_delete(name),
            Command::Unknown(input) => {
                println!("Unknown command: {} (try :help)", input);
            }
        }
        Flow::Continue
    }

    async fn say(&self, text: &str) {
        let files = self.registry.files();
        match self.session.submit(text, &files).await {
            SubmitOutcome::Replied(reply) => {
                println!("{}", format_message(&Message::assistant(reply)));
            }
            SubmitOutcome::Failed => {
                if let Some(message) = self.session.transcript().last() {
                    println!("{}", format_message(message));
                }
            }
            SubmitOutcome::Busy => println!("Still waiting for the previous reply."),
            SubmitOutcome::Ignored => {}
        }
    }

    /// Uploads run in the background so chat stays usable meanwhile.
    fn spawn_upload(&self, paths: Vec<PathBuf>) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let mut files = Vec::with_capacity(paths.len());
            for path in paths {
                if !registry.accepts(&path) {
                    println!("Skipping {}: unsupported file type", path.display());
                    continue;
                }
                match UploadFile::from_path(&path).await {
                    Ok(file) => files.push(file),
                    Err(e) => println!("Skipping {}: {}", path.display(), e),
                }
            }
            if files.is_empty() {
                return;
            }
            match registry.upload(files).await {
                Ok(all) => println!("Upload complete. {} document(s) in knowledge base.", all.len()),
                Err(e) => println!("Upload failed: {}", e),
            }
        });
    }

    fn spawn_delete(&self, name: String) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            match registry.delete(&name).await {
                Ok(()) => println!("Deleted {}.", name),
                Err(e) => println!("Could not delete {}: {}", name, e),
            }
        });
    }
}

fn print_prompt(panel: Panel) {
    use std::io::Write;
    print!("{}", panel.prompt());
    let _ = std::io::stdout().flush();
}
