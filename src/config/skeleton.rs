/// Commented `settings.conf` written on first run.
pub const SETTINGS_SKELETON_CONTENT: &str = "# storekeep settings\n\
#\n\
# Format: key = value\n\
# Lines starting with # or // are comments; inline comments need a space before them.\n\
#\n\
#-----------------------------------------------------------------------------------------------------------------------\n\
#\n\
# ---------- Preferences ----------\n\
#\n\
# Ask before installing or uninstalling when the installer is privileged\n\
# (no OS confirmation dialog will appear).\n\
require_user_action = true\n\
#\n\
# Install updates in the background.\n\
automatic_updates = true\n\
#\n\
# Network required by background jobs: any | unmetered | not_roaming\n\
updater_network_type = any\n\
#\n\
# Hours between background refresh/update runs.\n\
auto_update_interval_hours = 4\n\
#\n\
# ---------- Repository ----------\n\
#\n\
# HTTP(S) base URL or a local mirror directory.\n\
repository_url = https://repo.example.org\n\
#\n\
# ---------- Device ----------\n\
#\n\
# Directory holding installed packages (defaults to <config>/device).\n\
# device_root = /var/lib/storekeep\n\
#\n\
device_sdk = 34\n\
# Supported ABIs, most preferred first.\n\
device_abis = arm64-v8a, armeabi-v7a\n\
#\n\
# Installs bypass OS confirmation.\n\
privileged_installer = false\n\
#\n\
# Package id of this client; it is never offered for uninstall.\n\
self_package_id = app.storekeep.client\n\
#\n\
# Device policy restrictions.\n\
disallow_install = false\n\
disallow_uninstall = false\n";
