use core_types::PageHost;
use parking_lot::Mutex;
use url::Url;

#[derive(Debug, Default)]
struct HostState {
    pathname: String,
    title: String,
    history: Vec<String>,
    assigned: Vec<String>,
}

#[derive(Debug)]
pub struct MemoryHost {
    origin: String,
    state: Mutex<HostState>,
}

impl MemoryHost {
    pub fn new(origin: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            state: Mutex::new(HostState {
                pathname: pathname.into(),
                ..HostState::default()
            }),
        }
    }

    pub fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    pub fn assigned(&self) -> Vec<String> {
        self.state.lock().assigned.clone()
    }

    pub fn last_assigned(&self) -> Option<String> {
        self.state.lock().assigned.last().cloned()
    }

    pub fn back(&self) -> bool {
        let mut state = self.state.lock();
        match state.history.pop() {
            Some(previous) => {
                state.pathname = previous;
                true
            }
            None => false,
        }
    }

    fn path_of(&self, url: &str) -> String {
        Url::parse(&self.origin)
            .and_then(|origin| origin.join(url))
            .map(|resolved| resolved.path().to_string())
            .unwrap_or_else(|_| url.to_string())
    }

    fn go(&self, url: &str) {
        let path = self.path_of(url);
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut state.pathname, path);
        state.history.push(previous);
    }
}

impl PageHost for MemoryHost {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn pathname(&self) -> String {
        self.state.lock().pathname.clone()
    }

    fn assign(&self, url: &str) {
        self.go(url);
        self.state.lock().assigned.push(url.to_string());
    }

    fn push_state(&self, url: &str) {
        self.go(url);
    }

    fn set_title(&self, title: &str) {
        self.state.lock().title = title.to_string();
    }
}
