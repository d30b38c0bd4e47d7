//! Integration tests for the Evolution client stack
//!
//! These tests drive zone clients, the shared multiplexer, the registry,
//! and zone enumeration end-to-end against a simulated SAM served over an
//! in-memory duplex stream, including:
//! - Typed reads and sets against the simulator's seeded state
//! - Degree-byte sanitization on temperature replies
//! - Multiplexer sharing across zone clients for one device
//! - Zone discovery by name probing

use std::time::Duration;

use evo_client::{enumerate_zones, CommandMux, DeviceRegistry, MuxConfig, ZoneClient, ZoneInfo};
use evo_sim::VirtualSam;
use tokio::io::DuplexStream;

mod helpers {
    use super::*;

    /// Multiplexer wired to a simulated SAM
    pub fn mux_with_sam(sam: VirtualSam) -> CommandMux<DuplexStream> {
        let (near, far) = tokio::io::duplex(1024);
        tokio::spawn(sam.serve(far));
        CommandMux::new(near)
    }

    /// Multiplexer wired to the default simulator fixture
    pub fn default_mux() -> CommandMux<DuplexStream> {
        mux_with_sam(VirtualSam::new())
    }

    /// Multiplexer whose device never answers, with a short retry budget
    pub fn silent_mux() -> CommandMux<DuplexStream> {
        let (near, far) = tokio::io::duplex(1024);
        // Keep the far end open so exchanges time out instead of erroring
        std::mem::forget(far);
        let config = MuxConfig {
            reply_timeout: Duration::from_millis(50),
            attempts: 3,
        };
        CommandMux::with_config(near, config)
    }
}

mod zone_client_tests {
    use super::*;

    #[tokio::test]
    async fn initial_fixture_values_read_back() {
        let client = ZoneClient::new(1, 1, helpers::default_mux());

        assert_eq!(client.read_current_temperature().await, Some(72));
        assert_eq!(client.read_fan_mode().await, Some("AUTO".to_string()));
        assert_eq!(client.read_cooling_setpoint().await, Some(75));
        assert_eq!(client.read_heating_setpoint().await, Some(70));

        let mode = client.read_hvac_mode().await.unwrap();
        assert_eq!(mode.mode, "HEAT");
        assert!(!mode.active);
    }

    #[tokio::test]
    async fn sets_are_acknowledged_and_read_back() {
        let client = ZoneClient::new(1, 1, helpers::default_mux());

        assert!(client.set_fan_mode("low").await);
        assert!(client.set_cooling_setpoint(78).await);
        assert!(client.set_heating_setpoint(68).await);
        assert!(client.set_hvac_mode("cool").await);

        assert_eq!(client.read_fan_mode().await, Some("LOW".to_string()));
        assert_eq!(client.read_cooling_setpoint().await, Some(78));
        assert_eq!(client.read_heating_setpoint().await, Some(68));

        let mode = client.read_hvac_mode().await.unwrap();
        assert_eq!(mode.mode, "COOL");
        assert!(!mode.active);
    }

    #[tokio::test]
    async fn heat_cool_alias_sets_auto_mode() {
        let client = ZoneClient::new(1, 1, helpers::default_mux());

        assert!(client.set_hvac_mode("heat_cool").await);
        assert_eq!(client.read_hvac_mode().await.unwrap().mode, "AUTO");
    }

    #[tokio::test]
    async fn second_system_reads_its_own_state() {
        let mux = helpers::default_mux();
        let client = ZoneClient::new(2, 2, mux);

        let mode = client.read_hvac_mode().await.unwrap();
        assert_eq!(mode.mode, "COOL");
        assert!(mode.active);
        assert_eq!(client.read_cooling_setpoint().await, Some(60));
    }

    #[tokio::test]
    async fn degree_byte_is_stripped_before_decoding() {
        // The fixture stores `72<0xF8>F`; the connection layer drops the
        // raw degree byte, so the payload decodes as a plain temperature
        let mut sam = VirtualSam::new();
        sam.set("S1Z4RT", [b'9', b'9', 0xF8, b'F']);
        let client = ZoneClient::new(1, 4, helpers::mux_with_sam(sam));

        assert_eq!(client.read_current_temperature().await, Some(99));
    }

    #[tokio::test]
    async fn unknown_parameter_resolves_absent() {
        // The simulator answers NAK for unknown keys; retries exhaust and
        // the read resolves absent rather than erroring
        let client = ZoneClient::new(3, 1, helpers::default_mux());

        assert_eq!(client.read_current_temperature().await, None);
    }

    #[tokio::test]
    async fn silent_device_resolves_reads_and_sets_absent() {
        let client = ZoneClient::new(1, 1, helpers::silent_mux());

        assert_eq!(client.read_heating_setpoint().await, None);
        assert!(!client.set_heating_setpoint(70).await);
    }
}

mod sharing_tests {
    use super::*;

    #[tokio::test]
    async fn zone_clients_for_one_device_share_the_mux() {
        let registry = DeviceRegistry::new();

        let mux_a = registry
            .get_or_create("sam-0", || async { Ok(helpers::default_mux()) })
            .await
            .unwrap();
        let mux_b = registry
            .get_or_create("sam-0", || async { Ok(helpers::default_mux()) })
            .await
            .unwrap();
        let mux_other = registry
            .get_or_create("sam-1", || async { Ok(helpers::default_mux()) })
            .await
            .unwrap();

        let first = ZoneClient::new(1, 1, mux_a);
        let second = ZoneClient::new(1, 2, mux_b);
        let third = ZoneClient::new(1, 1, mux_other);

        assert!(first.channel().shares_device(second.channel()));
        assert!(!first.channel().shares_device(third.channel()));
    }

    #[tokio::test]
    async fn concurrent_zone_clients_interleave_safely() {
        let mux = helpers::default_mux();
        let zone1 = ZoneClient::new(1, 1, mux.clone());
        let zone2 = ZoneClient::new(2, 2, mux);

        let (temp, set_ok, mode) = tokio::join!(
            zone1.read_current_temperature(),
            zone1.set_cooling_setpoint(74),
            zone2.read_hvac_mode(),
        );

        assert_eq!(temp, Some(72));
        assert!(set_ok);
        assert_eq!(mode.unwrap().mode, "COOL");
    }
}

mod enumeration_tests {
    use super::*;

    #[tokio::test]
    async fn only_named_zones_are_discovered() {
        let mut sam = VirtualSam::new();
        sam.set("S1Z1NAME", "LIVING ROOM");
        sam.set("S1Z3NAME", "BASEMENT");
        let mux = helpers::mux_with_sam(sam);

        let zones = enumerate_zones(&mux, 1).await;

        assert_eq!(
            zones,
            vec![
                ZoneInfo {
                    system_id: 1,
                    zone_id: 1,
                    name: "LIVING ROOM".to_string(),
                },
                ZoneInfo {
                    system_id: 1,
                    zone_id: 3,
                    name: "BASEMENT".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn enumeration_is_per_system() {
        let mut sam = VirtualSam::new();
        sam.set("S1Z1NAME", "UPSTAIRS");
        sam.set("S2Z1NAME", "SHOP");
        let mux = helpers::mux_with_sam(sam);

        let system1 = enumerate_zones(&mux, 1).await;
        let system2 = enumerate_zones(&mux, 2).await;

        assert_eq!(system1.len(), 1);
        assert_eq!(system1[0].name, "UPSTAIRS");
        assert_eq!(system2.len(), 1);
        assert_eq!(system2[0].name, "SHOP");
    }
}
