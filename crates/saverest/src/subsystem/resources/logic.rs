/// Script execution state the save/restore path touches: the active run-list
/// and the queue of objects waiting to be destroyed.
#[derive(Debug, Default)]
pub struct LogicManager {
    run_list_id: u32,
    kill_list: Vec<u32>,
    restart_requested: bool,
}

impl LogicManager {
    pub fn new(run_list_id: u32) -> Self {
        LogicManager {
            run_list_id,
            kill_list: Vec::new(),
            restart_requested: false,
        }
    }

    pub fn return_run_list(&self) -> u32 {
        self.run_list_id
    }

    /// Switch to a new run-list; processing restarts from its first object
    /// on the next logic cycle.
    pub fn express_change_session(&mut self, run_list_id: u32) {
        log::debug!("logic: session change {} -> {}", self.run_list_id, run_list_id);
        self.run_list_id = run_list_id;
        self.restart_requested = true;
    }

    /// Consumed by the logic loop once it has restarted.
    pub fn take_restart_request(&mut self) -> bool {
        std::mem::take(&mut self.restart_requested)
    }

    pub fn add_to_kill_list(&mut self, object_id: u32) {
        if !self.kill_list.contains(&object_id) {
            self.kill_list.push(object_id);
        }
    }

    pub fn kill_list(&self) -> &[u32] {
        &self.kill_list
    }

    pub fn reset_kill_list(&mut self) {
        self.kill_list.clear();
    }
}
