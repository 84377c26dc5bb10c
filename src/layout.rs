use std::path::PathBuf;

use paths::normalize;

/// Where the upstream checkout, the scheduler fork and the main codebase live.
#[derive(Clone, Debug)]
pub struct Layout {
    /// Root of the main codebase, holding `vendor/` and `kube-scheduler/`.
    pub base: PathBuf,
    pub upstream: PathBuf,
    pub fork: PathBuf,
    /// Import namespace of the upstream project, e.g. `k8s.io`.
    pub namespace: String,
    /// Repository name of the upstream project inside its namespace.
    pub repo: String,
    /// Import path of the main codebase.
    pub module: String,
}

/// A subtree of one repository and the subtree it corresponds to in another.
#[derive(Clone, Debug, PartialEq)]
pub struct DirMapping {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl DirMapping {
    fn new(source: PathBuf, destination: PathBuf) -> DirMapping {
        DirMapping { source, destination }
    }

    pub fn reversed(&self) -> DirMapping {
        DirMapping::new(self.destination.clone(), self.source.clone())
    }
}

/// A literal import path prefix and its replacement.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportRewrite {
    pub from: String,
    pub to: String,
}

impl Layout {
    /// Upstream defaults to `<base>/../../../<namespace>/<repo>` and the fork
    /// to `<base>/../KubeGPU-scheduler`, matching a GOPATH checkout. `base`
    /// should already be canonical so the `..` steps follow the real directories.
    pub fn new(base: PathBuf, namespace: &str, repo: &str, module: &str) -> Layout {
        let upstream = normalize(&base.join("..").join("..").join("..").join(namespace).join(repo));
        let fork = normalize(&base.join("..").join("KubeGPU-scheduler"));
        Layout {
            base,
            upstream,
            fork,
            namespace: namespace.to_string(),
            repo: repo.to_string(),
            module: module.to_string(),
        }
    }

    pub fn vendor_dir(&self) -> PathBuf {
        self.base.join("vendor")
    }

    /// Where the upstream tree itself lands inside the vendor directory.
    pub fn vendored_upstream(&self) -> PathBuf {
        self.vendor_dir().join(&self.namespace).join(&self.repo)
    }

    pub fn main_scheduler_dir(&self) -> PathBuf {
        self.base.join("kube-scheduler")
    }

    pub fn upstream_to_fork(&self) -> Vec<DirMapping> {
        vec![
            DirMapping::new(self.upstream.join("pkg").join("scheduler"), self.fork.join("pkg").join("scheduler")),
            DirMapping::new(self.upstream.join("cmd").join("kube-scheduler"),
                            self.fork.join("cmd").join("kube-scheduler")),
        ]
    }

    pub fn fork_to_main(&self) -> Vec<DirMapping> {
        vec![
            DirMapping::new(self.fork.join("pkg").join("scheduler"), self.main_scheduler_dir().join("pkg")),
            DirMapping::new(self.fork.join("cmd").join("kube-scheduler"), self.main_scheduler_dir().join("cmd")),
        ]
    }

    /// Upstream scheduler import paths rewritten to their home in the main codebase.
    pub fn import_rewrites(&self) -> Vec<ImportRewrite> {
        let upstream_module = format!("{}/{}", self.namespace, self.repo);
        let scheduler_module = format!("{}/kube-scheduler", self.module);
        vec![
            ImportRewrite {
                from: format!("{}/pkg/scheduler", upstream_module),
                to: format!("{}/pkg", scheduler_module),
            },
            ImportRewrite {
                from: format!("{}/cmd/kube-scheduler", upstream_module),
                to: format!("{}/cmd", scheduler_module),
            },
        ]
    }
}
