//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it with
//! a `tokio-tungstenite` client, so admission, event ordering and delivery
//! are exercised over an actual socket.

#[cfg(feature = "websocket")]
mod websocket {
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::{SinkExt, StreamExt};
    use roomrelay_transport::{
        ConnectionId, DeliveryMode, Transport, TransportError, TransportEvent,
        WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    const KEY: &str = "open-sesame";

    async fn bind() -> WebSocketTransport {
        WebSocketTransport::bind("127.0.0.1:0", KEY)
            .await
            .expect("should bind")
    }

    async fn connect(transport: &WebSocketTransport, key: &str) -> ClientWs {
        let url = format!("ws://{}/?key={key}", transport.local_addr());
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("client should connect");
        ws
    }

    /// Polls until one event is available, failing the test after a second.
    async fn next_event(transport: &mut WebSocketTransport) -> TransportEvent {
        let mut events = Vec::new();
        let n = tokio::time::timeout(
            Duration::from_secs(1),
            transport.poll_events(&mut events),
        )
        .await
        .expect("timed out waiting for an event");
        assert!(n >= 1);
        events.remove(0)
    }

    #[tokio::test]
    async fn test_admitted_peer_produces_connected_event() {
        let mut transport = bind().await;
        let _client = connect(&transport, KEY).await;

        match next_event(&mut transport).await {
            TransportEvent::Connected { peer, .. } => {
                assert!(peer.ip().is_loopback());
            }
            other => panic!("expected Connected, got {other:?}"),
        }
        assert_eq!(transport.peer_count(), 1);
    }

    #[tokio::test]
    async fn test_wrong_key_is_refused() {
        let transport = bind().await;
        let url = format!("ws://{}/?key=wrong", transport.local_addr());
        let result = tokio_tungstenite::connect_async(url).await;
        assert!(result.is_err(), "handshake should be refused");

        let url = format!("ws://{}/", transport.local_addr());
        assert!(tokio_tungstenite::connect_async(url).await.is_err());
    }

    #[tokio::test]
    async fn test_percent_encoded_query_key_is_admitted() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0", "open sesame&co")
            .await
            .expect("should bind");
        let url = format!("ws://{}/?key=open%20sesame%26co", transport.local_addr());
        let _client = tokio_tungstenite::connect_async(url)
            .await
            .expect("encoded key should be accepted");

        assert!(matches!(
            next_event(&mut transport).await,
            TransportEvent::Connected { .. }
        ));
    }

    #[tokio::test]
    async fn test_received_bytes_are_surfaced_unmodified() {
        let mut transport = bind().await;
        let mut client = connect(&transport, KEY).await;
        let connection = match next_event(&mut transport).await {
            TransportEvent::Connected { connection, .. } => connection,
            other => panic!("expected Connected, got {other:?}"),
        };

        client
            .send(Message::Binary(Bytes::from_static(&[9, 8, 7])))
            .await
            .expect("client send");

        match next_event(&mut transport).await {
            TransportEvent::Received { connection: from, data, mode } => {
                assert_eq!(from, connection);
                assert_eq!(&data[..], &[9, 8, 7]);
                assert_eq!(mode, DeliveryMode::ReliableOrdered);
            }
            other => panic!("expected Received, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_reaches_client() {
        let mut transport = bind().await;
        let mut client = connect(&transport, KEY).await;
        let connection = match next_event(&mut transport).await {
            TransportEvent::Connected { connection, .. } => connection,
            other => panic!("expected Connected, got {other:?}"),
        };

        transport
            .send(connection, Bytes::from_static(b"\x00\x05"), DeliveryMode::Unreliable)
            .expect("send should queue");

        let msg = tokio::time::timeout(Duration::from_secs(1), client.next())
            .await
            .expect("timed out")
            .expect("stream ended")
            .expect("ws error");
        assert_eq!(&msg.into_data()[..], b"\x00\x05");
    }

    #[tokio::test]
    async fn test_client_close_produces_disconnected_event() {
        let mut transport = bind().await;
        let mut client = connect(&transport, KEY).await;
        let connection = match next_event(&mut transport).await {
            TransportEvent::Connected { connection, .. } => connection,
            other => panic!("expected Connected, got {other:?}"),
        };

        client.close(None).await.expect("close");

        match next_event(&mut transport).await {
            TransportEvent::Disconnected { connection: gone, .. } => {
                assert_eq!(gone, connection);
            }
            other => panic!("expected Disconnected, got {other:?}"),
        }
        assert_eq!(transport.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_fails() {
        let transport = bind().await;
        let result = transport.send(
            ConnectionId::new(u64::MAX),
            Bytes::from_static(b"x"),
            DeliveryMode::ReliableOrdered,
        );
        assert!(matches!(result, Err(TransportError::UnknownConnection(_))));
    }

    #[tokio::test]
    async fn test_shutdown_stops_polling_and_sending() {
        let mut transport = bind().await;
        transport.shutdown().await.expect("shutdown");

        let mut events = Vec::new();
        assert_eq!(transport.poll_events(&mut events).await, 0);
        let result = transport.send(
            ConnectionId::new(1),
            Bytes::from_static(b"x"),
            DeliveryMode::ReliableOrdered,
        );
        assert!(matches!(result, Err(TransportError::Shutdown)));
    }
}
