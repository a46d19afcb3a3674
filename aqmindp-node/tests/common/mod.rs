//! Fakes shared by the node integration tests
//!
//! - simulated time, one handle is both the delay and the clock
//! - a scripted radio and a scripted broker transport whose state the test
//!   keeps a handle to after the node takes ownership
//! - fixed-value sensors and actuators that record what they were told

#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    net::{IpAddr, Ipv4Addr},
    rc::Rc,
};

use aqmindp_node::{
    clock::Clock, ActuatorCommand, ActuatorError, Actuator, BrokerEndpoint, BrokerTransport,
    Connectivity, Credentials, InboundMessage, NodeConfig, Radio, RadioStatus, Role,
};
use aqmindp_sensor::{AirQualitySample, SensorError, SensorStatus, SensorSuite};
use embedded_hal::delay::DelayNs;
use rand::rngs::mock::StepRng;

pub const NODE_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42));
pub const TOPIC: &str = "sensors/bedroom";

pub fn config(role: Role) -> NodeConfig {
    let mut config = NodeConfig::new(
        role,
        Credentials {
            ssid: "lab".into(),
            password: "hunter2".into(),
        },
        BrokerEndpoint {
            host: "192.168.1.10".into(),
            port: 1883,
        },
        TOPIC,
    );
    config.device_id = 7;
    config
}

/// Simulated monotonic time. Delays advance it and are recorded.
#[derive(Clone, Default)]
pub struct SimTime {
    now_ns: Rc<Cell<u64>>,
    delays_ns: Rc<RefCell<Vec<u64>>>,
}

impl SimTime {
    pub fn advance_ms(&self, ms: u64) {
        self.now_ns.set(self.now_ns.get() + ms * 1_000_000);
    }

    pub fn delays_ms(&self) -> Vec<u64> {
        self.delays_ns
            .borrow()
            .iter()
            .map(|ns| ns / 1_000_000)
            .collect()
    }

    pub fn total_delay_ms(&self) -> u64 {
        self.delays_ns.borrow().iter().sum::<u64>() / 1_000_000
    }
}

impl SimTime {
    fn sleep(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
        self.delays_ns.borrow_mut().push(ns);
    }
}

impl DelayNs for SimTime {
    fn delay_ns(&mut self, ns: u32) {
        self.sleep(u64::from(ns));
    }

    // the default splits long waits into several calls
    fn delay_ms(&mut self, ms: u32) {
        self.sleep(u64::from(ms) * 1_000_000);
    }
}

impl Clock for SimTime {
    fn now_ms(&self) -> u64 {
        self.now_ns.get() / 1_000_000
    }
}

#[derive(Default)]
pub struct RadioScript {
    pub queued: VecDeque<RadioStatus>,
    /// Reported once `queued` runs dry
    pub steady: Option<RadioStatus>,
    pub begins: usize,
    pub polls: usize,
    pub disconnects: usize,
}

#[derive(Clone, Default)]
pub struct FakeRadio(pub Rc<RefCell<RadioScript>>);

impl FakeRadio {
    pub fn steady(status: RadioStatus) -> Self {
        let radio = Self::default();
        radio.0.borrow_mut().steady = Some(status);
        radio
    }

    pub fn associated() -> Self {
        Self::steady(RadioStatus::Connected(NODE_ADDR))
    }

    pub fn set_steady(&self, status: RadioStatus) {
        self.0.borrow_mut().steady = Some(status);
    }

    pub fn script(&self) -> std::cell::Ref<'_, RadioScript> {
        self.0.borrow()
    }
}

impl Radio for FakeRadio {
    fn begin(&mut self, _credentials: &Credentials) {
        self.0.borrow_mut().begins += 1;
    }

    fn status(&mut self) -> RadioStatus {
        let mut script = self.0.borrow_mut();
        script.polls += 1;
        match script.queued.pop_front() {
            Some(status) => status,
            None => script.steady.unwrap_or(RadioStatus::Idle),
        }
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().disconnects += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportFault;

#[derive(Default)]
pub struct BrokerState {
    /// Consumed one per connect attempt, success once empty
    pub connect_results: VecDeque<Result<(), TransportFault>>,
    pub connected: bool,
    pub client_ids: Vec<String>,
    pub keep_alive_secs: Option<u16>,
    pub published: Vec<(String, Vec<u8>)>,
    pub subscribed: Vec<String>,
    pub inbound: VecDeque<InboundMessage>,
    pub fail_publish: bool,
    pub fail_poll: bool,
    pub polls: usize,
}

#[derive(Clone, Default)]
pub struct FakeTransport(pub Rc<RefCell<BrokerState>>);

impl FakeTransport {
    pub fn state(&self) -> std::cell::RefMut<'_, BrokerState> {
        self.0.borrow_mut()
    }

    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        self.0.borrow_mut().inbound.push_back(InboundMessage {
            topic: topic.into(),
            payload: payload.to_vec(),
        });
    }

    /// Broker side drops the session
    pub fn sever(&self) {
        self.0.borrow_mut().connected = false;
    }
}

impl BrokerTransport for FakeTransport {
    type Error = TransportFault;

    fn connect(
        &mut self,
        _endpoint: &BrokerEndpoint,
        client_id: &str,
        keep_alive_secs: u16,
    ) -> Result<(), TransportFault> {
        let mut state = self.0.borrow_mut();
        state.client_ids.push(client_id.into());
        state.keep_alive_secs = Some(keep_alive_secs);
        let result = state.connect_results.pop_front().unwrap_or(Ok(()));
        state.connected = result.is_ok();
        result
    }

    fn is_connected(&self) -> bool {
        self.0.borrow().connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), TransportFault> {
        let mut state = self.0.borrow_mut();
        if state.fail_publish {
            return Err(TransportFault);
        }
        state.published.push((topic.into(), payload.to_vec()));
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportFault> {
        self.0.borrow_mut().subscribed.push(topic.into());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, TransportFault> {
        let mut state = self.0.borrow_mut();
        state.polls += 1;
        if state.fail_poll {
            return Err(TransportFault);
        }
        Ok(state.inbound.pop_front())
    }

    fn disconnect(&mut self) {
        self.0.borrow_mut().connected = false;
    }
}

/// Sensors returning the same values every cycle
pub struct FakeSensors {
    pub climate: Result<(f32, f32), SensorError>,
    pub air: Result<AirQualitySample, SensorError>,
    pub compensations: Vec<(f32, f32)>,
}

impl FakeSensors {
    pub fn new(tvoc: i32, eco2: i32, aqi: i32) -> Self {
        Self {
            climate: Ok((21.5, 40.25)),
            air: Ok(AirQualitySample {
                status: SensorStatus::Normal,
                aqi,
                tvoc,
                eco2,
            }),
            compensations: Vec::new(),
        }
    }
}

impl SensorSuite for FakeSensors {
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorError> {
        self.climate
    }

    fn read_air_quality(&mut self) -> Result<AirQualitySample, SensorError> {
        self.air
    }

    fn set_compensation(&mut self, temperature: f32, humidity: f32) -> Result<(), SensorError> {
        self.compensations.push((temperature, humidity));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingActuators {
    pub applied: Vec<ActuatorCommand>,
}

impl Actuator for RecordingActuators {
    fn apply(&mut self, cmd: ActuatorCommand) -> Result<(), ActuatorError> {
        self.applied.push(cmd);
        Ok(())
    }
}

pub type TestNet = Connectivity<FakeRadio, FakeTransport, SimTime, StepRng>;

pub struct Rig {
    pub time: SimTime,
    pub radio: FakeRadio,
    pub transport: FakeTransport,
}

impl Rig {
    pub fn new(radio: FakeRadio) -> Self {
        Self {
            time: SimTime::default(),
            radio,
            transport: FakeTransport::default(),
        }
    }

    pub fn net(&self, config: &NodeConfig) -> TestNet {
        Connectivity::new(
            self.radio.clone(),
            self.transport.clone(),
            self.time.clone(),
            StepRng::new(0xa11, 1),
            config,
        )
    }
}
