/// Render an argv as a copy-pasteable shell command line.
pub fn format_command_line(argv: &[&str]) -> String {
    shell_words::join(argv)
}
