//! The pool of search workers and the dispatch of jobs onto them.
//!
//! Worker zero is the main thread: it owns the time manager, wakes the
//! helper workers for Lazy-SMP, decides when to stop, and arbitrates the
//! best result. All workers share the transposition table and nothing
//! else; each owns its board, root moves, and heuristic tables outright.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::cell::UnsafeCell;
use std::mem;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::thread::{self, JoinHandle};

use sable::board::Board;
use sable::core::move_list::MoveList;
use sable::core::piece_move::Move;

use crate::consts::*;
use crate::search::{Job, Searcher};
use crate::sync::LockLatch;
use crate::time_manager::Limits;

const KILOBYTE: usize = 1000;
const WORKER_STACK_SIZE: usize = 18_000 * KILOBYTE;
const POOL_SIZE: usize = mem::size_of::<ThreadPool>();

// An object the same size as a thread pool. A cheap route to a mutable
// global: Rust offers no safe mutable statics, and the pool must outlive
// every thread it spawns.
type DummyThreadPool = [u8; POOL_SIZE];

pub static mut THREADPOOL: DummyThreadPool = [0; POOL_SIZE];

static THREADPOOL_INIT: Once = Once::new();

/// Initializes the global thread pool, once.
#[cold]
pub fn init_threadpool() {
    THREADPOOL_INIT.call_once(|| unsafe {
        // A spawned thread builds the pool so the large worker structures
        // never land on the caller's stack.
        let builder = thread::Builder::new()
            .name("Pool-Starter".to_string())
            .stack_size(WORKER_STACK_SIZE);
        let handle = builder
            .spawn(|| {
                let pool: *mut ThreadPool = mem::transmute(&mut THREADPOOL);
                ptr::write(pool, ThreadPool::new());
            })
            .unwrap();
        handle.join().unwrap();
    });
}

/// Returns access to the global thread pool.
#[inline(always)]
pub fn threadpool() -> &'static mut ThreadPool {
    unsafe { mem::transmute::<&mut DummyThreadPool, &'static mut ThreadPool>(&mut THREADPOOL) }
}

// Wrapper to move a raw worker pointer into its spawned thread.
struct SearcherPtr {
    ptr: UnsafeCell<*mut Searcher>,
}

unsafe impl Sync for SearcherPtr {}
unsafe impl Send for SearcherPtr {}

/// The thread pool of the engine.
pub struct ThreadPool {
    /// Access to each worker's structure.
    pub threads: Vec<UnsafeCell<*mut Searcher>>,
    /// OS handles of the worker threads.
    handles: Vec<JoinHandle<()>>,
    /// Stop flag: when true, every worker unwinds its search.
    pub stop: AtomicBool,
}

impl ThreadPool {
    /// Creates a new pool holding only the main thread.
    pub fn new() -> Self {
        let mut pool = ThreadPool {
            threads: Vec::new(),
            handles: Vec::new(),
            stop: AtomicBool::new(true),
        };
        pool.attach_thread();
        pool
    }

    /// Spawns one new worker thread parked in its idle loop.
    fn attach_thread(&mut self) {
        unsafe {
            let thread_ptr: SearcherPtr = self.create_thread();
            let builder = thread::Builder::new()
                .name(format!("Worker-{}", self.size() - 1))
                .stack_size(WORKER_STACK_SIZE);
            let handle = builder
                .spawn(move || {
                    let thread_ptr = thread_ptr;
                    let worker = &mut **thread_ptr.ptr.get();
                    worker.cond.lock();
                    worker.idle_loop();
                })
                .unwrap();
            self.handles.push(handle);
        }
    }

    /// Allocates a worker structure on the heap. Only called by
    /// `attach_thread`.
    fn create_thread(&mut self) -> SearcherPtr {
        let id = self.threads.len();
        let cond = Arc::new(LockLatch::new());
        unsafe {
            let layout = Layout::new::<Searcher>();
            let new_ptr: *mut Searcher = alloc_zeroed(layout).cast();
            ptr::write(new_ptr, Searcher::new(id, cond));
            self.threads.push(UnsafeCell::new(new_ptr));
            SearcherPtr {
                ptr: UnsafeCell::new(new_ptr),
            }
        }
    }

    /// Returns the number of workers.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.threads.len()
    }

    /// Returns the main worker.
    pub fn main(&mut self) -> &mut Searcher {
        unsafe {
            let main_thread: *mut Searcher = *self.threads.get_unchecked(0).get();
            &mut *main_thread
        }
    }

    /// Iterates over shared references to every worker.
    pub fn workers(&self) -> impl Iterator<Item = &Searcher> {
        self.threads.iter().map(|t| unsafe { &**t.get() })
    }

    /// Sets whether searches write UCI output to stdout.
    pub fn stdout(&mut self, use_stdout: bool) {
        USE_STDOUT.store(use_stdout, Ordering::Relaxed);
    }

    /// Sets the number of workers. Blocks until the current search ends;
    /// never leaves fewer than one worker.
    pub fn set_thread_count(&mut self, num: usize) {
        if num >= 1 {
            let num = num.min(MAX_THREADS);
            self.wait_for_finish();
            self.kill_all();
            while self.size() < num {
                self.attach_thread();
            }
        }
    }

    /// Kills and de-allocates every worker, blocking until all have
    /// drained.
    pub fn kill_all(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.wait_for_finish();

        unsafe {
            for t in self.threads.iter() {
                let worker: &Searcher = &**t.get();
                worker.kill.store(true, Ordering::SeqCst);
                worker.cond.set();
            }

            let mut results = Vec::with_capacity(self.handles.len());
            while let Some(handle) = self.handles.pop() {
                results.push(handle.join());
            }

            while let Some(cell) = self.threads.pop() {
                let worker: *mut Searcher = *cell.get();
                ptr::drop_in_place(worker);
                let ptr: NonNull<u8> = NonNull::new_unchecked(worker).cast();
                dealloc(ptr.as_ptr(), Layout::new::<Searcher>());
            }

            while let Some(result) = results.pop() {
                result.unwrap_or_else(|e| println!("worker thread failed: {:?}", e));
            }
        }
    }

    /// Sets the stop flag all workers poll.
    #[inline(always)]
    pub fn set_stop(&mut self, stop: bool) {
        self.stop.store(stop, Ordering::Relaxed);
    }

    /// Blocks until every worker is idle.
    pub fn wait_for_finish(&self) {
        for worker in self.workers() {
            worker.searching.wait(false);
        }
    }

    /// Blocks until every non-main worker is idle.
    pub fn wait_for_non_main(&self) {
        for worker in self.workers().filter(|w| w.id != 0) {
            worker.searching.wait(false);
        }
    }

    /// Blocks until the given worker is idle.
    pub fn wait_for_thread(&self, id: usize) {
        for worker in self.workers().filter(|w| w.id == id) {
            worker.searching.wait(false);
        }
    }

    /// Enqueues an arbitrary task on one worker and wakes it.
    pub fn start_custom_job<F>(&mut self, id: usize, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        debug_assert!(id < self.size());
        unsafe {
            let worker: &mut Searcher = &mut **self.threads[id].get();
            worker.searching.set(true);
            *worker.job.get() = Job::Custom(Box::new(f));
            worker.cond.set();
        }
    }

    /// Clears the heuristic tables of every worker, for a new game.
    pub fn clear_all(&mut self) {
        self.wait_for_finish();
        for t in self.threads.iter_mut() {
            unsafe {
                (**t.get()).clear();
            }
        }
    }

    /// Wakes the non-main workers for a Lazy-SMP search. Only the main
    /// worker calls this, after stamping the transposition generation.
    pub fn start_non_main_searches(&mut self) {
        unsafe {
            for t in self.threads.iter().skip(1) {
                let worker: &mut Searcher = &mut **t.get();
                *worker.job.get() = Job::Search;
                worker.cond.set();
            }
        }
    }

    /// Snapshots the root position and limits into every worker and
    /// starts the main thread, which in turn starts the rest. Returns
    /// without blocking on the search.
    pub fn start_thinking(&mut self, board: &Board, limits: &Limits) {
        self.wait_for_finish();

        // The timer starts counting from the arrival of `go`.
        if limits.use_time_management() {
            timer().init(limits.start, limits, board.turn());
        } else {
            timer().start_timer(limits.start);
        }

        let root_moves: MoveList = board.generate_moves();
        assert!(!root_moves.is_empty());

        self.stop.store(false, Ordering::Relaxed);

        unsafe {
            for t in self.threads.iter_mut() {
                let worker: &mut Searcher = &mut **t.get();
                worker.nodes.store(0, Ordering::Relaxed);
                worker.depth_completed = 0;
                worker.sel_depth = 0;
                worker.board = board.shallow_clone();
                worker.limit = limits.clone();
                worker.root_moves.replace(&root_moves);
                worker.searching.set(true);
            }
            let main: &mut Searcher = self.main();
            *main.job.get() = Job::Search;
            main.cond.set();
        }
    }

    /// Performs a blocking search, returning the best move found.
    pub fn search(&mut self, board: &Board, limits: &Limits) -> Move {
        self.start_thinking(board, limits);
        self.wait_for_finish();
        self.best_move()
    }

    /// Returns the best move of the last completed search.
    pub fn best_move(&mut self) -> Move {
        self.main().best_move
    }

    /// Returns the total number of nodes searched by all workers.
    pub fn nodes(&self) -> u64 {
        self.workers()
            .map(|w| w.nodes.load(Ordering::Relaxed))
            .sum()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.kill_all();
    }
}
