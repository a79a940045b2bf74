use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentMatchedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_matched_producer: Vec<EventProducer<PaymentMatchedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_matched: Option<EventHandler<PaymentMatchedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_matched = hooks.on_payment_matched.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_matched }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_matched {
            result.payment_matched_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_matched {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_matched: Option<Handler<PaymentMatchedEvent>>,
}

impl EventHooks {
    pub fn on_payment_matched<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentMatchedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_matched = Some(Arc::new(f));
        self
    }
}
