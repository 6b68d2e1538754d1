use std::sync::mpsc;

/// Hand-off channel between parallel producers and a single-writer
/// consumer. Senders are cheap to clone into worker closures; the
/// receiver drains everything the batch produced once the pool joins.
pub struct BatchSender<T> {
    tx: mpsc::Sender<T>,
}

pub struct BatchReceiver<T> {
    rx: mpsc::Receiver<T>,
}

pub fn channel<T>() -> (BatchSender<T>, BatchReceiver<T>) {
    let (tx, rx) = mpsc::channel();
    (BatchSender { tx }, BatchReceiver { rx })
}

impl<T> Clone for BatchSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> BatchSender<T> {
    pub fn send(&self, value: T) -> Result<(), mpsc::SendError<T>> {
        self.tx.send(value)
    }
}

impl<T> BatchReceiver<T> {
    pub fn try_recv(&self) -> Result<T, mpsc::TryRecvError> {
        self.rx.try_recv()
    }

    /// Everything currently buffered, without blocking for more.
    pub fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            out.push(value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::channel;

    #[test]
    fn drain_returns_buffered_values_in_send_order() {
        let (tx, rx) = channel();
        for i in 0..5 {
            tx.send(i).expect("receiver alive");
        }

        assert_eq!(rx.drain(), vec![0, 1, 2, 3, 4]);
        assert!(rx.drain().is_empty());
    }
}
