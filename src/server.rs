use log::{error, info, warn};

use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};

use door_core::access::{
    decode_tamper_ack, decode_validate, encode_tamper, encode_validate, TamperKind, TAMPER_PATH,
    VALIDATE_PATH,
};
use door_core::door::Decision;
use door_core::pn532::TagUid;

use crate::config::CONFIG;
use crate::constants::{HTTP_RESPONSE_BUFFER_SIZE, REQUEST_BODY_BUFFER_SIZE, SERVER_QUEUE_DEPTH};
use crate::http::HttpClient;
use crate::network;

#[derive(Debug, Clone)]
pub enum ServerRequest {
    Validate(TagUid),
    ReportTamper(TamperKind),
}

pub type RequestChannel = Channel<NoopRawMutex, ServerRequest, SERVER_QUEUE_DEPTH>;
/// Answers to `Validate`, one at a time since the door waits for each
pub type DecisionChannel = Channel<NoopRawMutex, Decision, 1>;

/// Queue a request without waiting. Returns false when the queue is full.
pub fn send(channel: &RequestChannel, request: ServerRequest) -> bool {
    match channel.try_send(request) {
        Ok(()) => true,
        Err(e) => {
            warn!("Server queue full, dropping {:?}", e);
            false
        }
    }
}

/// Talks to the access-control server on behalf of the door task
pub struct Server {
    client: HttpClient,
}

impl Server {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Ask the server whether `uid` may open this door. Anything but an
    /// explicit grant keeps the door locked.
    async fn validate(&mut self, uid: &TagUid) -> Decision {
        if !network::is_up(self.client.stack()) {
            warn!("Network down, cannot validate card");
            return Decision::Unavailable;
        }

        let tag_id = uid.to_hex();
        let mut body = [0u8; REQUEST_BODY_BUFFER_SIZE];
        let len = match encode_validate(&tag_id, CONFIG.client_id, &mut body) {
            Ok(len) => len,
            Err(e) => {
                error!("Encoding validation request failed: {}", e);
                return Decision::Unavailable;
            }
        };

        let mut response = [0u8; HTTP_RESPONSE_BUFFER_SIZE];
        let response = match self
            .client
            .post_json(VALIDATE_PATH, &body[..len], &mut response)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Validation request failed: {:?}", e);
                return Decision::Unavailable;
            }
        };

        if !response.head.is_success() {
            warn!(
                "Server answered validation with status {}",
                response.head.status
            );
            return Decision::Unavailable;
        }

        match decode_validate(response.body) {
            Ok(verdict) if verdict.allowed => {
                info!("Access granted for {} (door {:?})", tag_id, verdict.door_id);
                Decision::Granted
            }
            Ok(_) => {
                info!("Access denied for {}", tag_id);
                Decision::Denied
            }
            Err(e) => {
                error!("Unexpected validation response: {}", e);
                Decision::Unavailable
            }
        }
    }

    async fn report_tamper(&mut self, kind: TamperKind) {
        if !network::is_up(self.client.stack()) {
            error!("Network down, tamper alarm not reported");
            return;
        }

        let mut body = [0u8; REQUEST_BODY_BUFFER_SIZE];
        let len = match encode_tamper(kind, CONFIG.client_id, &mut body) {
            Ok(len) => len,
            Err(e) => {
                error!("Encoding tamper report failed: {}", e);
                return;
            }
        };

        let mut response = [0u8; HTTP_RESPONSE_BUFFER_SIZE];
        match self
            .client
            .post_json(TAMPER_PATH, &body[..len], &mut response)
            .await
        {
            Ok(response) if response.head.is_success() => match decode_tamper_ack(response.body) {
                Ok(ack) => info!(
                    "Tamper alarm reported (success: {}, log {:?})",
                    ack.success, ack.log_id
                ),
                Err(e) => warn!("Tamper alarm sent, unexpected answer: {}", e),
            },
            Ok(response) => error!(
                "Tamper alarm rejected with status {}",
                response.head.status
            ),
            Err(e) => error!("Tamper alarm not reported: {:?}", e),
        }
    }
}

/// Serve the door task's requests one by one, so HTTP round trips never
/// hold up relocking or contact sampling
#[embassy_executor::task]
pub async fn server_task(
    mut server: Server,
    requests: &'static RequestChannel,
    decisions: &'static DecisionChannel,
) {
    loop {
        match requests.receive().await {
            ServerRequest::Validate(uid) => {
                let decision = server.validate(&uid).await;
                decisions.send(decision).await;
            }
            ServerRequest::ReportTamper(kind) => server.report_tamper(kind).await,
        }
    }
}
