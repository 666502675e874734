//! Turns a debug configuration into a transport the front end can use.

use sockdap_config::{DebugConfiguration, LaunchConfiguration};
use sockdap_platform::TransportEndpoint;
use tracing::info;

use crate::args::LaunchOptions;
use crate::error::DapError;
use crate::session::{DebugSession, TransportHandle};
use crate::supervisor::{LaunchRequest, Supervisor};
use crate::tool::{ToolInvocation, ToolLocator};

/// How the front end reaches the debugger.
#[derive(Debug)]
pub enum AdapterDescriptor {
    /// A socket someone else is already listening on. Nothing was spawned.
    NamedPipe(TransportHandle),
    /// A debugger we launched and now supervise.
    Launched(DebugSession),
}

impl AdapterDescriptor {
    pub fn handle(&self) -> &TransportHandle {
        match self {
            AdapterDescriptor::NamedPipe(handle) => handle,
            AdapterDescriptor::Launched(session) => session.handle(),
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut DebugSession> {
        match self {
            AdapterDescriptor::NamedPipe(_) => None,
            AdapterDescriptor::Launched(session) => Some(session),
        }
    }
}

/// Resolves the debugger and launches it, or attaches, per configuration.
pub struct DescriptorFactory {
    supervisor: Supervisor,
    locator: Box<dyn ToolLocator>,
    pass_through_stdout: bool,
}

impl DescriptorFactory {
    pub fn new(supervisor: Supervisor, locator: Box<dyn ToolLocator>) -> Self {
        Self {
            supervisor,
            locator,
            pass_through_stdout: false,
        }
    }

    pub fn with_pass_through_stdout(mut self, pass_through_stdout: bool) -> Self {
        self.pass_through_stdout = pass_through_stdout;
        self
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Produce a descriptor for `config`.
    ///
    /// # Errors
    ///
    /// Tool resolution errors abort before anything is spawned; launch
    /// errors are those of [`Supervisor::launch`].
    pub async fn create(&self, config: &DebugConfiguration) -> Result<AdapterDescriptor, DapError> {
        match config {
            DebugConfiguration::Attach(attach) => {
                info!(name = %attach.name, socket = %attach.socket.display(), "attaching");
                Ok(AdapterDescriptor::NamedPipe(TransportHandle::new(
                    TransportEndpoint::new(&attach.socket),
                )))
            }
            DebugConfiguration::Launch(launch) => {
                let tool = self.locator.resolve()?;
                let request = self.launch_request(tool, launch);
                info!(name = %launch.name, program = %launch.program, "launching");
                let session = self.supervisor.launch(&request).await?;
                Ok(AdapterDescriptor::Launched(session))
            }
        }
    }

    fn launch_request(&self, tool: ToolInvocation, launch: &LaunchConfiguration) -> LaunchRequest {
        let mut env = tool.env;
        env.extend(launch.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        LaunchRequest {
            binary: tool.bin_path,
            base_args: tool.args,
            env,
            cwd: launch.cwd.clone(),
            program: launch.program.clone(),
            program_args: launch.args.clone(),
            options: LaunchOptions {
                stop_at_entry: launch.stop_at_entry,
                show_protocol_log: launch.show_protocol_log,
                pass_through_stdout: self.pass_through_stdout,
            },
        }
    }
}

impl std::fmt::Debug for DescriptorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorFactory")
            .field("supervisor", &self.supervisor)
            .field("pass_through_stdout", &self.pass_through_stdout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LoggingHost;
    use sockdap_config::AttachConfiguration;
    use sockdap_core::OutputChannel;
    use sockdap_platform::{EndpointAllocator, ScratchDir};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingLocator {
        calls: Arc<AtomicUsize>,
        result: Option<ToolInvocation>,
    }

    impl ToolLocator for CountingLocator {
        fn resolve(&self) -> Result<ToolInvocation, DapError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().ok_or(DapError::ToolNotFound {
                name: "dbg".into(),
                searched: 0,
            })
        }
    }

    fn make_factory(
        result: Option<ToolInvocation>,
    ) -> (tempfile::TempDir, Arc<AtomicUsize>, DescriptorFactory) {
        let tmp = tempfile::TempDir::new().unwrap();
        let scratch = Arc::new(ScratchDir::in_root(tmp.path()));
        let supervisor = Supervisor::new(
            Arc::new(EndpointAllocator::new(scratch)),
            Arc::new(OutputChannel::default()),
            Arc::new(LoggingHost),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let locator = CountingLocator {
            calls: calls.clone(),
            result,
        };
        (tmp, calls, DescriptorFactory::new(supervisor, Box::new(locator)))
    }

    #[tokio::test]
    async fn attach_spawns_nothing() {
        let (_tmp, calls, factory) = make_factory(None);
        let config = DebugConfiguration::Attach(AttachConfiguration {
            name: "Attach".into(),
            debug_type: None,
            socket: PathBuf::from("/tmp/remote.socket"),
        });
        let descriptor = factory.create(&config).await.unwrap();
        assert!(matches!(descriptor, AdapterDescriptor::NamedPipe(_)));
        assert_eq!(descriptor.handle().path(), PathBuf::from("/tmp/remote.socket"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(factory.supervisor().allocator().scratch().path().is_none());
    }

    #[tokio::test]
    async fn missing_tool_aborts_launch() {
        let (_tmp, calls, factory) = make_factory(None);
        let config = DebugConfiguration::Launch(LaunchConfiguration::new("main.go"));
        let err = factory.create(&config).await.unwrap_err();
        assert!(matches!(err, DapError::ToolNotFound { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(factory.supervisor().allocator().scratch().path().is_none());
    }

    #[test]
    fn launch_request_merges_configuration() {
        let mut tool_env = HashMap::new();
        tool_env.insert("PATH".to_string(), "/usr/bin".to_string());
        tool_env.insert("MODE".to_string(), "tool".to_string());
        let tool = ToolInvocation {
            bin_path: PathBuf::from("/opt/dbg"),
            args: vec!["dap".into()],
            env: tool_env,
        };
        let mut launch = LaunchConfiguration::new("/src/main.go");
        launch.cwd = Some(PathBuf::from("/src"));
        launch.args = vec!["-v".into()];
        launch.env.insert("MODE".into(), "user".into());
        launch.stop_at_entry = true;

        let (_tmp, _calls, factory) = make_factory(None);
        let factory = factory.with_pass_through_stdout(true);
        let request = factory.launch_request(tool, &launch);

        assert_eq!(request.binary, PathBuf::from("/opt/dbg"));
        assert_eq!(request.base_args, vec!["dap"]);
        assert_eq!(request.env["MODE"], "user");
        assert_eq!(request.env["PATH"], "/usr/bin");
        assert_eq!(request.cwd, Some(PathBuf::from("/src")));
        assert_eq!(request.program, "/src/main.go");
        assert_eq!(request.program_args, vec!["-v"]);
        assert!(request.options.stop_at_entry);
        assert!(!request.options.show_protocol_log);
        assert!(request.options.pass_through_stdout);
    }
}
