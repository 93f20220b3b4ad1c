use carousel::RemoteCommand;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(RemoteCommand),
    ConfigReload,
}
