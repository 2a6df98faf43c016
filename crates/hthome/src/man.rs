//! Man page layout, shared with `build.rs`.

use clap::Command;

/// Subcommands that only make sense typed at a shell prompt.
const SKIPPED: &[&str] = &["completions", "help"];

/// Flatten `root` into one `(page name, command)` pair per man page, parents
/// first. Nested commands are renamed `parent-child` so `man hthome-light-on`
/// resolves.
pub fn pages(root: &Command) -> Vec<(String, Command)> {
    let mut out = Vec::new();
    collect(root.clone(), &mut out);
    out
}

fn collect(cmd: Command, out: &mut Vec<(String, Command)>) {
    let name = cmd.get_name().to_owned();
    let children: Vec<Command> = cmd
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set() && !SKIPPED.contains(&sub.get_name()))
        .map(|sub| sub.clone().name(format!("{name}-{}", sub.get_name())))
        .collect();

    out.push((name, cmd));
    for child in children {
        collect(child, out);
    }
}

pub fn render(cmd: &Command) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::cli::Cli;

    fn page_names() -> Vec<String> {
        pages(&Cli::command()).into_iter().map(|(name, _)| name).collect()
    }

    #[test]
    fn root_page_comes_first() {
        assert_eq!(page_names().first().map(String::as_str), Some("hthome"));
    }

    #[test]
    fn nested_commands_get_their_own_page() {
        let names = page_names();
        for expected in [
            "hthome-devices-list",
            "hthome-light-status",
            "hthome-light-on",
            "hthome-watch",
            "hthome-config-set-password",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}: {names:?}");
        }
    }

    #[test]
    fn completions_have_no_page() {
        assert!(
            !page_names().iter().any(|n| n.starts_with("hthome-completions")),
            "{:?}",
            page_names()
        );
    }

    #[test]
    fn rendered_page_carries_the_about_text() {
        let (_, light) = pages(&Cli::command())
            .into_iter()
            .find(|(name, _)| name == "hthome-light")
            .unwrap();
        let page = String::from_utf8(render(&light).unwrap()).unwrap();
        assert!(page.contains("Read or switch a light"), "{page}");
    }
}
