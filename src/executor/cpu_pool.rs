use super::panic_handler::{PanicHandler, PanicInfo};
use super::worker::{SharedState, Worker, WorkerStats};
use crate::config::Config;
use crate::error::Error;
use crate::integrand::Integrand;
use std::thread;

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    let core_id = core_id % num_cpus::get().max(1);
    unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        let result = libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        );
        if result != 0 {
            tracing::warn!(
                thread = thread::current().name().unwrap_or("unknown"),
                core_id,
                "failed to pin worker thread"
            );
        }
    }
}

/// Fixed set of OS threads launched for one integration run and joined at its end.
#[derive(Debug)]
pub(crate) struct CpuPool<'c> {
    config: &'c Config,
    num_threads: usize,
}

impl<'c> CpuPool<'c> {
    pub fn new(config: &'c Config, num_threads: usize) -> Self {
        Self {
            config,
            num_threads,
        }
    }

    /// Runs the worker loop on every thread and waits for all of them.
    ///
    /// Spawn failures and worker panics are reported through `shared.fail`, which
    /// also releases the threads that did start.
    pub fn run<I>(&self, shared: &SharedState<'_, I>) -> Vec<WorkerStats>
    where
        I: Integrand + ?Sized,
    {
        thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.num_threads);

            for id in 0..self.num_threads {
                let name = format!("{}-{}", self.config.thread_name_prefix, id);
                let mut builder = thread::Builder::new().name(name);

                if let Some(stack_size) = self.config.stack_size {
                    builder = builder.stack_size(stack_size);
                }

                let pin_workers = self.config.pin_workers;
                let spawned = builder.spawn_scoped(s, move || {
                    // Pin worker to core if requested
                    #[cfg(target_os = "linux")]
                    if pin_workers {
                        pin_thread_to_core(id);
                    }
                    #[cfg(not(target_os = "linux"))]
                    let _ = pin_workers;

                    let guard = PanicHandler::new();
                    match guard.execute(|| Worker::new(id, shared).run()) {
                        Ok(stats) => stats,
                        Err(info) => {
                            shared.fail(Error::WorkerPanic(info.message));
                            WorkerStats {
                                id,
                                ..WorkerStats::default()
                            }
                        }
                    }
                });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        shared.fail(Error::executor(format!("spawn failed: {}", e)));
                        break;
                    }
                }
            }

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(stats) => Some(stats),
                    Err(payload) => {
                        let info = PanicInfo::from_payload(payload);
                        shared.fail(Error::WorkerPanic(info.message));
                        None
                    }
                })
                .collect()
        })
    }
}
