// Server check and program information.

use anyhow::Result;

use super::{Session, VERSION};

const BANNER: &str = r"
       .__           _____  __
  _____|  | ___.__._/ ____\/  |_     slyft.io
 /  ___/  |<   |  |\   __\\   __\    The Service Layer for Things
 \___ \|  |_\___  | |  |   |  |      Licensed under the Apache License, Version 2.0
/____  >____/ ____| |__|   |__|
     \/     \/
";

const LICENSE: &str = r#"
Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
"#;

pub fn show_banner() {
    println!("{BANNER}");
}

pub fn show_info() {
    show_banner();
    println!("slyft, slyft.io");
    println!("info@slyft.io\n");
    println!("Version {VERSION}");
    println!("{LICENSE}");
}

pub fn ping(session: &Session<'_>) -> Result<()> {
    let body = session.api.ping()?;
    println!("{body}");
    Ok(())
}
