use fixit_atoms::reports::{Category, ReportListItem};
use reports_block::{
    AddressField, AppShell, FeedFilter, FeedLayout, LoginForm, LoginOutcome, Notice, Screen, SignUpForm,
    SignUpOutcome, SubmitOutcome, Tab, TabsView,
};

pub const HELP: &str = "\
Commands:
  login <email> <password>
  signup <email> <password> <confirm>
  signout
  tab <home|reports|upload>
  feed                      show the current tab's reports
  refresh                   reload the current tab's reports
  delete <url>              delete a report (reports and upload tabs)
  filter <trending|new|dangerous|solved|pending>
  pick                      choose an image for a new report
  next                      go to the next wizard step
  describe <text>
  category <graffiti|potholes|litter|broken infrastructure>
  address <line1|line2|city|eircode|country> <value>
  submit
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { email: String, password: String },
    SignUp { email: String, password: String, confirm: String },
    SignOut,
    Tab(Tab),
    Feed,
    Refresh,
    Delete(String),
    Filter(FeedFilter),
    Pick,
    Next,
    Describe(String),
    Category(Category),
    Address(AddressField, String),
    Submit,
    Help,
    Quit,
}

fn rest(words: &[&str]) -> String {
    words.join(" ")
}

fn parse_tab(name: &str) -> Option<Tab> {
    Tab::all()
        .iter()
        .copied()
        .find(|t| t.title().eq_ignore_ascii_case(name))
}

fn parse_filter(name: &str) -> Option<FeedFilter> {
    FeedFilter::all()
        .iter()
        .copied()
        .find(|f| f.label().eq_ignore_ascii_case(name))
}

fn parse_field(name: &str) -> Option<AddressField> {
    match name.to_ascii_lowercase().as_str() {
        "line1" => Some(AddressField::Line1),
        "line2" => Some(AddressField::Line2),
        "city" => Some(AddressField::City),
        "eircode" => Some(AddressField::Eircode),
        "country" => Some(AddressField::Country),
        _ => None,
    }
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let command = match words.as_slice() {
            [] => return Ok(None),
            ["login", email, password] => Command::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ["signup", email, password, confirm] => Command::SignUp {
                email: email.to_string(),
                password: password.to_string(),
                confirm: confirm.to_string(),
            },
            ["signout"] => Command::SignOut,
            ["tab", name] => Command::Tab(parse_tab(name).ok_or(format!("Unknown tab: {}", name))?),
            ["feed"] => Command::Feed,
            ["refresh"] => Command::Refresh,
            ["delete", url] => Command::Delete(url.to_string()),
            ["filter", name] => {
                Command::Filter(parse_filter(name).ok_or(format!("Unknown filter: {}", name))?)
            }
            ["pick"] => Command::Pick,
            ["next"] => Command::Next,
            ["describe", text @ ..] => Command::Describe(rest(text)),
            ["category", name @ ..] if !name.is_empty() => {
                Command::Category(rest(name).parse().map_err(|e| format!("{}", e))?)
            }
            ["address", field, value @ ..] => Command::Address(
                parse_field(field).ok_or(format!("Unknown address field: {}", field))?,
                rest(value),
            ),
            ["submit"] => Command::Submit,
            ["help"] => Command::Help,
            ["quit"] | ["exit"] => Command::Quit,
            [name, ..] => return Err(format!("Unknown or incomplete command: {} (try 'help')", name)),
        };
        Ok(Some(command))
    }
}

fn show_notice(notice: &Notice) {
    println!("[{}] {}", notice.title, notice.message);
}

fn show_items(layout: FeedLayout, items: &[ReportListItem]) {
    if items.is_empty() {
        println!("(no reports)");
        return;
    }
    if layout == FeedLayout::Horizontal {
        let thumbs: Vec<_> = items.iter().map(|i| i.report_id()).collect();
        println!("[{}]", thumbs.join("] ["));
        return;
    }
    for item in items {
        let category = item.category.map(|c| c.label()).unwrap_or("-");
        println!(
            "- {} | {} | {} | {} | {} votes\n  {}",
            item.report_id(),
            item.status.label(),
            category,
            item.description,
            item.votes,
            item.url
        );
    }
}

/// Short description of where the user is, used as the prompt.
pub fn prompt_for(screen: &Screen) -> String {
    match screen {
        Screen::Login { .. } => "login> ".to_string(),
        Screen::SignUp => "sign-up> ".to_string(),
        Screen::Tabs(tabs) => match tabs.active_tab() {
            Tab::Upload => {
                let step = tabs
                    .upload
                    .wizard
                    .try_lock()
                    .map(|w| w.step().index() + 1)
                    .unwrap_or(0);
                format!("upload[{}/4]> ", step)
            }
            tab => format!("{}> ", tab.title().to_lowercase()),
        },
    }
}

fn with_tabs(shell: &AppShell) -> Option<std::sync::Arc<TabsView>> {
    let tabs = shell.tabs();
    if tabs.is_none() {
        println!("Sign in with a verified account first.");
    }
    tabs
}

async fn show_feed(tabs: &TabsView) {
    match tabs.active_tab() {
        Tab::Home => {
            println!("{}\n{}", reports_block::HomeView::HEADER, tabs.home.greeting());
            println!("Latest reports:");
            show_items(tabs.home.feed.layout(), &tabs.home.feed.items());
            println!("Leaderboard:");
            for entry in tabs.home.leaderboard() {
                println!("  #{} {}, {} - {}", entry.rank, entry.city, entry.country, entry.points);
            }
        }
        Tab::Reports => {
            println!("Filter: {}", tabs.reports.filter().label());
            show_items(tabs.reports.feed.layout(), &tabs.reports.visible());
        }
        Tab::Upload => {
            println!("Your reports:");
            show_items(tabs.upload.feed.layout(), &tabs.upload.feed.items());
            let wizard = tabs.upload.wizard.lock().await;
            println!("Step {}/4: {}", wizard.step().index() + 1, wizard.step().title());
        }
    }
}

/// Run one command against the shell.
pub async fn run(shell: &AppShell, command: Command) {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
        Command::Login { email, password } => {
            shell.back_to_login();
            match shell.sign_in(&LoginForm::new(email, password)).await {
                LoginOutcome::SignedIn(user) => println!("Signed in as {}", user.email),
                LoginOutcome::VerifyEmail(notice) | LoginOutcome::Failed(notice) => {
                    show_notice(&notice)
                }
            }
        }
        Command::SignUp {
            email,
            password,
            confirm,
        } => {
            shell.open_sign_up();
            match shell.sign_up(&SignUpForm::new(email, password, confirm)).await {
                SignUpOutcome::Registered { notice, .. } => show_notice(&notice),
                SignUpOutcome::Mismatch(notice) | SignUpOutcome::Failed(notice) => {
                    show_notice(&notice)
                }
            }
        }
        Command::SignOut => match shell.sign_out().await {
            Ok(()) => println!("Signed out."),
            Err(e) => println!("Sign-out failed: {}", e),
        },
        command => {
            let Some(tabs) = with_tabs(shell) else {
                return;
            };
            run_in_tabs(shell, &tabs, command).await;
        }
    }
}

async fn run_in_tabs(shell: &AppShell, tabs: &TabsView, command: Command) {
    match command {
        Command::Tab(tab) => {
            tabs.select_tab(tab);
            show_feed(tabs).await;
        }
        Command::Feed => show_feed(tabs).await,
        Command::Refresh => {
            let tab = tabs.active_tab();
            match tabs.feed(tab).refresh().await {
                Ok(_) => show_feed(tabs).await,
                Err(e) => println!("Refresh failed: {}", e),
            }
        }
        Command::Delete(url) => {
            let result = match tabs.active_tab() {
                Tab::Reports => tabs.reports.feed.delete(&url).await,
                Tab::Upload => tabs.upload.delete(&url).await,
                Tab::Home => {
                    println!("Reports can be deleted from the Reports or Upload tab.");
                    return;
                }
            };
            match result {
                Ok(()) => println!("Deleted."),
                Err(e) => println!("Delete failed: {}", e),
            }
        }
        Command::Filter(filter) => {
            tabs.reports.set_filter(filter);
            if tabs.active_tab() == Tab::Reports {
                show_feed(tabs).await;
            }
        }
        Command::Pick => {
            tabs.select_tab(Tab::Upload);
            let mut wizard = tabs.upload.wizard.lock().await;
            if !wizard.accepts_image() {
                println!("An image is already chosen; submit this report first.");
                return;
            }
            match wizard.pick_image(shell.services().picker.as_ref()).await {
                Ok(true) => println!("Image selected. {}", wizard.step().title()),
                Ok(false) => println!("No image selected."),
                Err(e) => println!("Could not pick image: {}", e),
            }
        }
        Command::Next => {
            let mut wizard = tabs.upload.wizard.lock().await;
            match wizard.next() {
                Ok(step) => println!("Step {}/4: {}", step.index() + 1, step.title()),
                Err(_) => println!("Next is not available yet."),
            }
        }
        Command::Describe(text) => {
            tabs.upload.wizard.lock().await.set_description(text);
        }
        Command::Category(category) => {
            tabs.upload.wizard.lock().await.select_category(category);
            println!("Category: {}", category);
        }
        Command::Address(field, value) => {
            tabs.upload.wizard.lock().await.set_address_field(field, value);
        }
        Command::Submit => match tabs.upload.submit().await {
            Ok(SubmitOutcome::Submitted { notice, item }) => {
                show_notice(&notice);
                println!("{}", item.url);
            }
            Ok(SubmitOutcome::MissingInformation { notice, validation }) => {
                show_notice(&notice);
                let missing: Vec<_> = validation.missing.iter().map(|f| f.label()).collect();
                println!("Missing: {}", missing.join(", "));
            }
            Ok(SubmitOutcome::Failed { notice }) => show_notice(&notice),
            Err(_) => println!("Finish the earlier steps before submitting."),
        },
        Command::Help
        | Command::Quit
        | Command::Login { .. }
        | Command::SignUp { .. }
        | Command::SignOut => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_arguments() {
        assert_eq!(
            Command::parse("category broken infrastructure"),
            Ok(Some(Command::Category(Category::BrokenInfrastructure)))
        );
        assert_eq!(
            Command::parse("address line1 1 Main St"),
            Ok(Some(Command::Address(AddressField::Line1, "1 Main St".into())))
        );
        assert_eq!(
            Command::parse("describe  deep pothole "),
            Ok(Some(Command::Describe("deep pothole".into())))
        );
    }

    #[test]
    fn parses_tabs_and_filters_case_insensitively() {
        assert_eq!(Command::parse("tab Reports"), Ok(Some(Command::Tab(Tab::Reports))));
        assert_eq!(
            Command::parse("filter solved"),
            Ok(Some(Command::Filter(FeedFilter::Solved)))
        );
        assert!(Command::parse("tab settings").is_err());
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert!(Command::parse("login only-email").is_err());
        assert!(Command::parse("category noise").is_err());
        assert_eq!(Command::parse("quit"), Ok(Some(Command::Quit)));
    }
}
