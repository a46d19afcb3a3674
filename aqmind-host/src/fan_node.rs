use aqmind_host::{apply_env_overrides, HostRadio, LogActuators, MqttTransport, StdDelay};
use aqmindp_node::{Connectivity, FanNode, NodeConfig, Role};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut config = NodeConfig::from_build_config(Role::Consumer);
    apply_env_overrides(&mut config).map_err(|e| {
        log::error!("Bad configuration {e:}");
        e
    })?;

    let net = Connectivity::new(
        HostRadio::new(config.broker.clone()),
        MqttTransport::new(),
        StdDelay,
        StdRng::from_entropy(),
        &config,
    );

    let mut node = FanNode::new(net, LogActuators::default(), &config);
    node.run(&mut StdDelay)
}
