use std::path::PathBuf;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        WalkDir(::walkdir::Error);
        Regex(::regex::Error);
    }

    errors {
        DirectoryNotFound(path: PathBuf) {
            description("directory not found")
            display("Directory not found: {}", path.to_string_lossy())
        }
        CommandFailed(command: String, status: String) {
            description("external command failed")
            display("Command '{}' failed with {}", command, status)
        }
    }
}
