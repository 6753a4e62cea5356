//! Command lines issued by the pipelines
//!
//! The exact strings are part of the tool's contract: CI logs and wrapper
//! scripts match on them.

use crate::core::RegistryConfig;
use std::path::Path;

pub const GIT_ADD_ALL: &str = "git add --all";
pub const GIT_PUSH_TAGS: &str = "git push --tags";
pub const NPM_INSTALL: &str = "npm install";
pub const NPM_PUBLISH: &str = "npm publish";

pub fn git_checkout(reference: &str) -> String {
    format!("git checkout {}", reference)
}

pub fn git_pull(remote: &str, branch: &str) -> String {
    format!("git pull {} {}", remote, branch)
}

pub fn git_commit(message: &str) -> String {
    format!("git commit -am \"{}\"", message)
}

pub fn git_push(remote: &str, branch: &str) -> String {
    format!("git push {} {}", remote, branch)
}

pub fn git_tag(tag: &str) -> String {
    format!("git tag {}", tag)
}

pub fn docker_build(image: &str, dockerfile: Option<&Path>) -> String {
    match dockerfile {
        Some(path) => format!("docker build -t {} -f {} .", image, path.display()),
        None => format!("docker build -t {} .", image),
    }
}

pub fn docker_tag(image: &str, target: &str) -> String {
    format!("docker tag {}:latest {}", image, target)
}

pub fn docker_push(target: &str) -> String {
    format!("docker push {}", target)
}

/// Authenticate the local docker client against `registry`
///
/// Uses the password-stdin flow; the older `aws ecr get-login` eval form
/// has been removed from AWS CLI v2.
pub fn registry_login(registry: &RegistryConfig) -> String {
    let mut command = String::from("aws ecr get-login-password");
    if let Some(region) = &registry.region {
        command.push_str(&format!(" --region {}", region));
    }
    if let Some(profile) = &registry.profile {
        command.push_str(&format!(" --profile {}", profile));
    }
    command.push_str(&format!(
        " | docker login --username AWS --password-stdin {}",
        registry.url
    ));
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commands() {
        assert_eq!(git_checkout("master"), "git checkout master");
        assert_eq!(git_pull("origin", "master"), "git pull origin master");
        assert_eq!(git_commit("Release 1.3.0"), "git commit -am \"Release 1.3.0\"");
        assert_eq!(git_push("origin", "master"), "git push origin master");
        assert_eq!(git_tag("demo-1.3.0"), "git tag demo-1.3.0");
    }

    #[test]
    fn test_docker_commands() {
        assert_eq!(docker_build("demo", None), "docker build -t demo .");
        assert_eq!(
            docker_build("demo", Some(Path::new("/work/app/docker/Dockerfile"))),
            "docker build -t demo -f /work/app/docker/Dockerfile ."
        );
        assert_eq!(
            docker_tag("demo", "reg.example.com/ns/demo:latest"),
            "docker tag demo:latest reg.example.com/ns/demo:latest"
        );
        assert_eq!(
            docker_push("reg.example.com/ns/demo:latest"),
            "docker push reg.example.com/ns/demo:latest"
        );
    }

    #[test]
    fn test_registry_login() {
        let registry = RegistryConfig::new("reg.example.com", "ns");
        assert_eq!(
            registry_login(&registry),
            "aws ecr get-login-password | docker login --username AWS --password-stdin reg.example.com"
        );

        let registry = registry.with_region("us-west-1").with_profile("ci");
        assert_eq!(
            registry_login(&registry),
            "aws ecr get-login-password --region us-west-1 --profile ci | docker login --username AWS --password-stdin reg.example.com"
        );
    }
}
