use clap::Parser;

/// `swarm_agent` - the robot-side end of the allocation announcements.
///
/// This process listens for `TASK <task_id> ROBOT <robot_id>` datagrams sent by the
/// `swarm_controller` and keeps track of the tasks currently announced to its robot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The robot this agent acts for.
    ///
    /// Announcements naming another robot are logged at debug level and otherwise ignored;
    /// observers see every announcement.
    #[arg(long, env = "AGENT_ROBOT_ID")]
    pub robot_id: usize,

    /// The UDP address announcements are received on.
    ///
    /// Must match this robot's entry in the controller's `SWARM_ROBOT_ADDRS`.
    #[arg(long, env = "AGENT_LISTEN_ADDR", default_value = "0.0.0.0:7000")]
    pub listen_addr: String,
}
