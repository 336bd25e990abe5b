use tqdm::Tqdm;

/// Observer of byte counters during a streamed download. Purely cosmetic:
/// nothing a sink does can fail the transfer.
pub trait Progress: Send {
    fn begin(&mut self, _total: Option<u64>) {}

    fn advance(&mut self, bytes: u64);

    fn finish(&mut self) {}
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&mut self, _bytes: u64) {}
}

/// Terminal progress bar labelled with the destination file.
pub struct ConsoleProgress {
    label: String,
    bar: Option<Tqdm<()>>,
}

impl ConsoleProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            bar: None,
        }
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: Option<u64>) {
        let label = format!("Downloading {}", self.label);
        self.bar = Some(tqdm::pbar(total.map(|n| n as usize)).desc(Some(label)));
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = self.bar.as_mut() {
            let _ = bar.update(bytes as usize);
        }
    }

    fn finish(&mut self) {
        self.bar = None;
    }
}
