//! Remote probe command generation

use crate::models::{Config, HostTarget, RoleTargets};
use std::collections::BTreeMap;
use std::fmt::Write;

const SERIAL_PATH: &str = "/sys/class/dmi/id/product_serial";
const IB_CLASS_PATH: &str = "/sys/class/infiniband";

/// Builds the single shell command that reports one host's adapters
pub struct CommandBuilder;

impl CommandBuilder {
    /// Every configured host with the union of the adapters its roles name
    ///
    /// Server targets are merged first, then client targets; within a host
    /// the first occurrence of an adapter wins.
    pub fn host_targets(config: &Config) -> Vec<HostTarget> {
        let mut hosts: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for role in [&config.server, &config.client] {
            merge_role(&mut hosts, role);
        }

        hosts
            .into_iter()
            .map(|(hostname, devices)| HostTarget { hostname, devices })
            .collect()
    }

    /// Shell command printing `{"serial":..,"hcas":[..]}` for one host
    ///
    /// Each attribute is read with `cat` and falls back to the literal
    /// `ERROR` when the file is missing or unreadable.
    pub fn build(target: &HostTarget) -> String {
        let mut cmd = String::from(r#"echo "{"#);
        let _ = write!(cmd, r#"\"serial\":\"{}\","#, read_or_error(SERIAL_PATH));
        cmd.push_str(r#"\"hcas\":["#);

        for (i, hca) in target.devices.iter().enumerate() {
            if i > 0 {
                cmd.push(',');
            }
            let port = format!("{}/{}/ports/1", IB_CLASS_PATH, hca);
            let device = format!("{}/{}", IB_CLASS_PATH, hca);

            let _ = write!(cmd, r#"{{\"name\":\"{}\","#, hca);
            let _ = write!(cmd, r#"\"phys_state\":\"{}\","#, read_or_error(&format!("{}/phys_state", port)));
            let _ = write!(cmd, r#"\"state\":\"{}\","#, read_or_error(&format!("{}/state", port)));
            let _ = write!(cmd, r#"\"speed\":\"{}\","#, read_or_error(&format!("{}/rate", port)));
            let _ = write!(cmd, r#"\"fw_ver\":\"{}\","#, read_or_error(&format!("{}/fw_ver", device)));
            let _ = write!(cmd, r#"\"board_id\":\"{}\""#, read_or_error(&format!("{}/board_id", device)));
            cmd.push('}');
        }

        cmd.push_str(r#"]}""#);
        cmd
    }

    /// Commands for every target, keyed by hostname
    pub fn build_all(targets: &[HostTarget]) -> BTreeMap<String, String> {
        targets
            .iter()
            .map(|target| (target.hostname.clone(), Self::build(target)))
            .collect()
    }
}

fn merge_role(hosts: &mut BTreeMap<String, Vec<String>>, role: &RoleTargets) {
    for hostname in &role.hostnames {
        let devices = hosts.entry(hostname.clone()).or_default();
        for hca in &role.hcas {
            if !devices.contains(hca) {
                devices.push(hca.clone());
            }
        }
    }
}

fn read_or_error(path: &str) -> String {
    format!("$(cat {} 2>/dev/null || echo ERROR)", path)
}
