use aqmind_host::{
    apply_env_overrides, sensor_failure_rate, HostRadio, LogActuators, MqttTransport,
    SimulatedSensors, StdClock, StdDelay,
};
use aqmindp_node::{Connectivity, NodeConfig, Role, RoomNode};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = NodeConfig::from_build_config(Role::Producer);
    apply_env_overrides(&mut config).map_err(|e| {
        log::error!("Bad configuration {e:}");
        e
    })?;
    let failure_rate = sensor_failure_rate()?;
    if failure_rate > 0.0 {
        log::warn!("Simulated sensors fail {:.0}% of reads", failure_rate * 100.0);
    }

    let net = Connectivity::new(
        HostRadio::new(config.broker.clone()),
        MqttTransport::new(),
        StdDelay,
        StdRng::from_entropy(),
        &config,
    );
    let sensors = SimulatedSensors::new(StdRng::from_entropy(), failure_rate);

    let mut node = RoomNode::new(
        net,
        sensors,
        LogActuators::default(),
        StdClock::new(),
        &config,
    );
    node.run(&mut StdDelay)
}
